//! User-facing strings.

pub const GREETING: &str = "Отправьте мне запрос, и я найду материалы в Википедии, \
на GitHub, Stack Overflow и Хабре.\n\nСправка: /help";

pub const HELP: &str = "Помощь по боту\n\n\
Я ищу ответ на ваш запрос сразу в нескольких источниках: Википедия, GitHub, \
Stack Overflow и Хабр.\n\n\
Команды:\n\
/start - начать работу\n\
/help - показать эту справку\n\n\
Как использовать:\n\
Просто отправьте запрос, например «что такое фотосинтез» или «история интернета». \
Статью из Википедии можно листать кнопками «Предыдущая» и «Следующая», \
остальные результаты открываются кнопками под списком.";

pub const UNKNOWN_COMMAND: &str = "Неизвестная команда. Список команд: /help";
pub const QUERY_TOO_SHORT: &str = "Запрос слишком короткий. Попробуйте еще раз.";
pub const TEXT_ONLY: &str = "Я понимаю только текстовые сообщения. \
Просто напишите, что хотите найти, или используйте /help для справки.";
pub const SEARCHING: &str = "Ищу по всем источникам...";
pub const NO_RESULTS: &str = "По вашему запросу ничего не найдено. Попробуйте другой запрос.";

pub const SESSION_EXPIRED: &str = "Сессия истекла. Начните новый поиск.";
pub const NAVIGATION_LIMIT: &str = "Достигнут предел навигации.";
pub const EDIT_FAILED: &str = "Ошибка при обновлении сообщения.";
pub const ARTICLE_EXPIRED: &str = "Материал недоступен. Повторите поиск.";
pub const MALFORMED_ACTION: &str = "Неизвестное действие.";
pub const SEND_FAILED: &str = "Не удалось отправить материал.";

pub const PREV_BUTTON: &str = "Предыдущая";
pub const NEXT_BUTTON: &str = "Следующая";
pub const OPEN_BUTTON: &str = "Открыть";

/// Minimum query length, in characters.
pub const MIN_QUERY_LENGTH: usize = 2;
