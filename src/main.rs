fn main() {
    if let Err(err) = gitweave::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
