use error_response_mapper::{Config, envoy};

const CONFIG_FILE_PATH: &str = "./Config.yml";

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_FILE_PATH.into());

    let mappers = Config::load_from_file(&path)
        .and_then(Config::into_mappers)
        .unwrap_or_else(|e| {
            log::error!("failed to build response mappers from {path}: {e}");
            eprintln!("fatal: {e}");
            std::process::exit(1);
        });

    match envoy::to_yaml(&mappers) {
        Ok(yaml) => print!("{yaml}"),
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    }
}
