fn main() {
    if let Err(e) = seltrans::run() {
        eprintln!("seltrans: {e}");
        std::process::exit(1);
    }
}
