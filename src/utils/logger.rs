use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

// Фильтр по умолчанию, RUST_LOG имеет приоритет
const DEFAULT_FILTER: &str = "warn,voice_changer=info";

pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let mut builder = Builder::from_env(env);

    // Явно подавляем логи от определенных модулей
    builder
        .filter_module("mio", LevelFilter::Error)
        .filter_module("tokio_util", LevelFilter::Error)
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("hyper_util", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        // Вывод тулкита идёт через voice_changer::services::toolkit
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // Повторная инициализация (например, в тестах) не должна паниковать
    let _ = builder.try_init();
}
