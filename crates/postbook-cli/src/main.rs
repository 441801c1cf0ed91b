use std::process;

fn main() {
    match postbook_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("postbook error: {err}");
            process::exit(1);
        }
    }
}
