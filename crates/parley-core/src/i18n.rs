use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Display language for interface strings and notices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Send,
    ClearContext,
    NewDialog,
    Settings,
    History,
    TypeMessage,
    SaveDialog,
    ClearHistory,
    NoHistory,
    DialogSaved,
    ProviderFailed,
    PersistFailed,
    SavedAs,
    DialogNotFound,
    DialogDeleted,
    Language,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    pub fn all() -> &'static [Locale] {
        &[Locale::En, Locale::Ru]
    }

    pub fn text(&self, key: TextKey) -> &'static str {
        match self {
            Locale::En => match key {
                TextKey::Send => "Send",
                TextKey::ClearContext => "Clear Context",
                TextKey::NewDialog => "New Dialog",
                TextKey::Settings => "Settings",
                TextKey::History => "History",
                TextKey::TypeMessage => "Type a message...",
                TextKey::SaveDialog => "Save Dialog",
                TextKey::ClearHistory => "Clear All History",
                TextKey::NoHistory => "No saved dialogs",
                TextKey::DialogSaved => "Dialog saved successfully",
                TextKey::ProviderFailed => "Failed to get response from AI",
                TextKey::PersistFailed => "Failed to save chat history",
                TextKey::SavedAs => "Saved as",
                TextKey::DialogNotFound => "No dialog with id",
                TextKey::DialogDeleted => "Deleted",
                TextKey::Language => "Language",
            },
            Locale::Ru => match key {
                TextKey::Send => "Отправить",
                TextKey::ClearContext => "Очистить контекст",
                TextKey::NewDialog => "Новый диалог",
                TextKey::Settings => "Настройки",
                TextKey::History => "История",
                TextKey::TypeMessage => "Введите сообщение...",
                TextKey::SaveDialog => "Сохранить диалог",
                TextKey::ClearHistory => "Очистить всю историю",
                TextKey::NoHistory => "Нет сохраненных диалогов",
                TextKey::DialogSaved => "Диалог успешно сохранен",
                TextKey::ProviderFailed => "Не удалось получить ответ от ИИ",
                TextKey::PersistFailed => "Не удалось сохранить историю чата",
                TextKey::SavedAs => "Сохранено как",
                TextKey::DialogNotFound => "Нет диалога с id",
                TextKey::DialogDeleted => "Удалено",
                TextKey::Language => "Язык",
            },
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_is_english() {
        assert_eq!(Locale::default(), Locale::En);
        assert_eq!(Locale::default().text(TextKey::Send), "Send");
    }

    #[test]
    fn test_russian_strings() {
        assert_eq!(Locale::Ru.text(TextKey::History), "История");
        assert_eq!(Locale::Ru.text(TextKey::NoHistory), "Нет сохраненных диалогов");
    }

    #[test]
    fn test_parse_locale() {
        assert_eq!("ru".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }
}
