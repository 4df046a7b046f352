fn main() {
    if let Err(err) = table_reconcile::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
