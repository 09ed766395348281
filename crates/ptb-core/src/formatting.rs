//! Reply texts for panel payloads and outcomes.

use std::fmt::Display;

use crate::panel::{Account, PanelError, ServerDetails, ServerResources};

pub const NO_API_KEY: &str = "API ключ не установлен.";
pub const NO_API_KEY_FOR_SERVERS: &str =
    "API ключ не установлен. Пожалуйста, добавьте API ключ с помощью команды /profile.";
pub const API_KEY_PROMPT: &str = "Пожалуйста, введите ваш API ключ:";
pub const API_KEY_ADDED: &str = "API ключ успешно добавлен!";
pub const API_KEY_INVALID: &str = "Неверный API ключ. Попробуйте снова.";
pub const API_KEY_REMOVED: &str = "API ключ удален.";
pub const COMMAND_PROMPT: &str = "Пожалуйста, введите команду для отправки на сервер:";
pub const COMMAND_EMPTY: &str = "Команда не может быть пустой.";
pub const RENAME_PROMPT: &str = "Пожалуйста, введите новое имя для сервера:";
pub const RENAME_EMPTY: &str = "Имя не может быть пустым.";

pub const ACCOUNT_FAILED: &str = "Ошибка при получении информации об аккаунте";
pub const SERVERS_FAILED: &str = "Ошибка при получении данных о серверах";
pub const SERVER_INFO_FAILED: &str = "Ошибка при получении информации о сервере";
pub const RESOURCES_FAILED: &str = "Ошибка при получении информации о ресурсах сервера";
pub const RENAME_FAILED: &str = "Ошибка при переименовании сервера";

const MIB: u64 = 1024 * 1024;

pub fn welcome(title: &str) -> String {
    format!(
        "Здравствуйте, Вас приветствует бот {title}!\nС его помощью вы легко сможете управлять сервером без посещения сайта."
    )
}

/// Failure reply: `"{what}: {code}"` for a status, the raw transport text otherwise.
pub fn panel_failure(what: &str, err: &PanelError) -> String {
    match err {
        PanelError::Status(code) => format!("{what}: {code}"),
        PanelError::Transport(msg) => format!("Произошла ошибка при запросе: {msg}"),
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Да"
    } else {
        "Нет"
    }
}

fn or_na<T: Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn account(a: &Account) -> String {
    format!(
        "ID: {}\nВы админ? {}\nИмя пользователя: {}\nЭлектронная почта: {}\nИмя: {} {}",
        or_na(a.id),
        yes_no(a.admin),
        or_na(a.username.as_deref()),
        or_na(a.email.as_deref()),
        or_na(a.first_name.as_deref()),
        or_na(a.last_name.as_deref()),
    )
}

pub fn server_details(d: &ServerDetails) -> String {
    let lines = [
        format!("Имя сервера: {}", or_na(d.name.as_deref())),
        format!("Вы владелец? {}", yes_no(d.server_owner)),
        format!("UUID сервера: {}", or_na(d.uuid.as_deref())),
        format!("Описание сервера: {}", or_na(d.description.as_deref())),
        format!("ЦПУ сервера: {}%", or_na(d.limits.cpu)),
        format!("ОЗУ сервера: {} МБ", or_na(d.limits.memory)),
        format!("Диск сервера: {} МБ", or_na(d.limits.disk)),
        format!("Кол-во баз данных: {}", or_na(d.feature_limits.databases)),
        format!("Кол-во мест: {}", or_na(d.feature_limits.allocations)),
        format!("Кол-во бекапов: {}", or_na(d.feature_limits.backups)),
        format!(
            "SFTP сервера: {}:{}",
            or_na(d.sftp_details.ip.as_deref()),
            or_na(d.sftp_details.port)
        ),
        format!("Узел: {}", or_na(d.node.as_deref())),
        format!("Приостановлен: {}", yes_no(d.is_suspended)),
        format!("Устанавливается: {}", yes_no(d.is_installing)),
    ];
    lines.join("\n")
}

/// Russian label for a panel power state; unknown states pass through.
pub fn translate_state(state: &str) -> &str {
    match state {
        "starting" => "Запуск",
        "running" => "Запущен",
        "stopping" => "Выключение",
        "offline" => "Выключен",
        "installing" => "Установка",
        "install_failed" => "Ошибка установки",
        "suspended" => "Приостановлен",
        "restoring_backup" => "Восстановление",
        other => other,
    }
}

pub fn server_resources(r: &ServerResources) -> String {
    let state = r.current_state.as_deref().map(translate_state).unwrap_or("N/A");
    format!(
        "Статус сервера: {state}\nОЗУ сервера: {} МБ\nДиск сервера: {} МБ\nЦПУ сервера: {}%",
        r.resources.memory_bytes / MIB,
        r.resources.disk_bytes / MIB,
        r.resources.cpu_absolute,
    )
}

pub fn power_done(signal: &str) -> String {
    format!("Команда '{signal}' успешно выполнена.")
}

pub fn power_failed(signal: &str, err: &PanelError) -> String {
    panel_failure(&format!("Ошибка при выполнении команды '{signal}'"), err)
}

pub fn command_sent(command: &str) -> String {
    format!("Команда '{command}' успешно отправлена.")
}

pub fn command_failed(command: &str, err: &PanelError) -> String {
    panel_failure(&format!("Ошибка при отправке команды '{command}'"), err)
}

pub fn renamed(name: &str) -> String {
    format!("Сервер успешно переименован в '{name}'.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::ResourceUsage;

    #[test]
    fn status_failures_carry_the_code() {
        let msg = power_failed("start", &PanelError::Status(409));
        assert_eq!(msg, "Ошибка при выполнении команды 'start': 409");
    }

    #[test]
    fn transport_failures_carry_the_raw_message() {
        let msg = panel_failure("x", &PanelError::Transport("connection refused".into()));
        assert_eq!(msg, "Произошла ошибка при запросе: connection refused");
    }

    #[test]
    fn resources_floor_to_mib_and_translate_state() {
        let r = ServerResources {
            current_state: Some("running".to_string()),
            resources: ResourceUsage {
                memory_bytes: 3 * MIB + 12345,
                disk_bytes: MIB - 1,
                cpu_absolute: 12.5,
            },
        };
        assert_eq!(
            server_resources(&r),
            "Статус сервера: Запущен\nОЗУ сервера: 3 МБ\nДиск сервера: 0 МБ\nЦПУ сервера: 12.5%"
        );
    }

    #[test]
    fn unknown_state_passes_through() {
        assert_eq!(translate_state("hibernating"), "hibernating");
        assert_eq!(translate_state("install_failed"), "Ошибка установки");
    }

    #[test]
    fn account_fills_missing_fields() {
        let a = Account {
            id: Some(3),
            admin: true,
            username: Some("bob".to_string()),
            ..Default::default()
        };
        let text = account(&a);
        assert!(text.starts_with("ID: 3\nВы админ? Да\nИмя пользователя: bob"));
        assert!(text.ends_with("Имя: N/A N/A"));
    }

    #[test]
    fn details_render_sftp_endpoint() {
        let mut d = ServerDetails::default();
        d.sftp_details.ip = Some("10.0.0.2".to_string());
        d.sftp_details.port = Some(2022);
        let text = server_details(&d);
        assert!(text.contains("SFTP сервера: 10.0.0.2:2022"));
        assert!(text.contains("Имя сервера: N/A"));
        assert!(text.ends_with("Устанавливается: Нет"));
    }
}
