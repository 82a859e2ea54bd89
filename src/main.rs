fn main() {
    if let Err(error) = orthoflow::run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
