fn main() {
    if let Err(e) = thumbkit_lib::run() {
        eprintln!("thumbkit エラー: {:#}", e);
        std::process::exit(1);
    }
}
