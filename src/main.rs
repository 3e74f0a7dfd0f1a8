fn main() {
    if let Err(err) = flatload::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
