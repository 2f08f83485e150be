//! diff::circbuf
//!
//! Fixed-capacity ring of lines used to hold pre-context during a cut.

/// Ring buffer of strings with a fixed capacity.
///
/// Pushing past capacity overwrites the oldest line. Storage is allocated
/// once; indices wrap with modular arithmetic.
///
/// # Example
///
/// ```
/// use gitweave::diff::StrCircBuf;
///
/// let mut buf = StrCircBuf::new(3);
/// for line in ["a", "b", "c", "d"] {
///     buf.push(line.to_string());
/// }
/// assert_eq!(buf.lines(), vec!["b", "c", "d"]);
/// ```
#[derive(Debug, Clone)]
pub struct StrCircBuf {
    slots: Vec<String>,
    /// Index of the oldest line.
    head: usize,
    len: usize,
}

impl StrCircBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![String::new(); capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of lines currently held.
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a line, evicting the oldest when full. No-op at capacity 0.
    pub fn push(&mut self, line: String) {
        let cap = self.capacity();
        if cap == 0 {
            return;
        }
        if self.len < cap {
            self.slots[(self.head + self.len) % cap] = line;
            self.len += 1;
        } else {
            self.slots[self.head] = line;
            self.head = (self.head + 1) % cap;
        }
    }

    /// Contents, oldest first.
    pub fn lines(&self) -> Vec<String> {
        let cap = self.capacity();
        (0..self.len)
            .map(|i| self.slots[(self.head + i) % cap].clone())
            .collect()
    }

    /// Empty the buffer and return its contents, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        let cap = self.capacity();
        let out = (0..self.len)
            .map(|i| std::mem::take(&mut self.slots[(self.head + i) % cap]))
            .collect();
        self.head = 0;
        self.len = 0;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, items: &[&str]) -> StrCircBuf {
        let mut buf = StrCircBuf::new(capacity);
        for item in items {
            buf.push(item.to_string());
        }
        buf
    }

    #[test]
    fn keeps_last_three_of_four() {
        let buf = filled(3, &["1", "2", "3", "4"]);
        assert_eq!(buf.lines(), vec!["2", "3", "4"]);
        assert_eq!(buf.size(), 3);
    }

    #[test]
    fn partial_fill_in_order() {
        let buf = filled(5, &["x", "y"]);
        assert_eq!(buf.lines(), vec!["x", "y"]);
    }

    #[test]
    fn zero_capacity_is_always_empty() {
        let buf = filled(0, &["a", "b", "c"]);
        assert!(buf.is_empty());
        assert!(buf.lines().is_empty());
    }

    #[test]
    fn wraps_many_times() {
        let items: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let buf = filled(4, &refs);
        assert_eq!(buf.lines(), vec!["96", "97", "98", "99"]);
    }

    #[test]
    fn drain_resets() {
        let mut buf = filled(2, &["a", "b", "c"]);
        assert_eq!(buf.drain(), vec!["b", "c"]);
        assert!(buf.is_empty());
        buf.push("d".into());
        assert_eq!(buf.lines(), vec!["d"]);
    }
}
