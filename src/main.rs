fn main() {
    if let Err(e) = sf444view::app::run_cli() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
