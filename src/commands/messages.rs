//! User-facing reply text

use crate::core::clock::to_display;
use crate::features::reminders::{Reminder, RepeatInterval};

pub const WELCOME: &str = "🔔 **Бот-напоминалка**\n\n\
    📌 **Доступные команды:**\n\
    /remind - Создать напоминание\n\
    /my_reminders - Список напоминаний\n\
    /del_reminder - Удалить напоминание\n\
    /set_repeat - Настроить повтор\n\n\
    Или используйте кнопки ниже:";

pub const ASK_REMINDER: &str = "📝 Введите напоминание в формате:\n\
    `ДД.ММ.ГГГГ ЧЧ:ММ Текст`\n\n\
    Пример:\n\
    `20.10.2025 10:00 Позвонить маме`";

pub const FORMAT_ERROR: &str = "❌ **Ошибка формата!**\n\
    Используйте: ДД.ММ.ГГГГ ЧЧ:ММ Текст\n\n\
    Пример: `20.10.2025 10:00 Позвонить маме`";

pub const NO_REMINDERS: &str = "📭 У вас пока нет активных напоминаний";
pub const ASK_DELETE_ID: &str = "✏️ Введите **ID напоминания** для удаления:";
pub const ASK_REPEAT_ID: &str = "✏️ Введите **ID напоминания** для настройки повтора:";
pub const NUMERIC_ID: &str = "❌ Введите **числовой ID** напоминания!";
pub const NOT_UNDERSTOOD: &str = "Я вас не понимаю. Используйте кнопки или команды.";
pub const WRONG_CONTEXT: &str = "Неверный контекст";
pub const UNKNOWN_CHOICE: &str = "❌ Неизвестный вариант повтора";
pub const OPERATION_FAILED: &str = "❌ Произошла ошибка, попробуйте ещё раз";

pub fn created(reminder_id: i64, date: &str, time: &str, text: &str) -> String {
    format!(
        "✅ **Напоминание создано!**\n\n\
         📅 **Дата:** {date} {time}\n\
         📝 **Текст:** {text}\n\n\
         ID: {reminder_id}"
    )
}

pub fn reminder_list(reminders: &[Reminder]) -> String {
    let mut response = String::from("📋 **Ваши напоминания:**\n\n");
    for reminder in reminders {
        let repeat_info = match reminder.interval() {
            Ok(RepeatInterval::None) => String::new(),
            Ok(interval) => format!(" (повтор: {})", interval_name(interval)),
            Err(_) => format!(
                " (повтор: {})",
                reminder.repeat_interval.as_deref().unwrap_or_default()
            ),
        };
        response.push_str(&format!(
            "🆔 **{}**: ⏰ {}{}\n✏️ {}\n\n",
            reminder.id,
            to_display(&reminder.next_time),
            repeat_info,
            reminder.text
        ));
    }
    response.trim_end().to_string()
}

pub fn deleted(reminder_id: i64) -> String {
    format!("✅ Напоминание **{reminder_id}** успешно удалено!")
}

pub fn not_found(reminder_id: i64) -> String {
    format!("❌ Напоминание **{reminder_id}** не найдено!")
}

pub fn choose_interval(reminder_id: i64) -> String {
    format!("Выберите интервал повторения для напоминания **{reminder_id}**:")
}

pub fn repeat_updated(reminder_id: i64, interval: RepeatInterval) -> String {
    match interval {
        RepeatInterval::None => format!("🔄 Повтор для напоминания **{reminder_id}** отключен"),
        _ => format!(
            "🔄 Установлен повтор для напоминания **{reminder_id}**: {}",
            interval_name(interval)
        ),
    }
}

pub fn interval_name(interval: RepeatInterval) -> &'static str {
    match interval {
        RepeatInterval::None => "без повтора",
        RepeatInterval::Daily => "ежедневно",
        RepeatInterval::Weekly => "еженедельно",
        RepeatInterval::Monthly => "ежемесячно",
    }
}

pub fn interval_button_label(interval: RepeatInterval) -> &'static str {
    match interval {
        RepeatInterval::None => "❌ Без повтора",
        RepeatInterval::Daily => "Ежедневно",
        RepeatInterval::Weekly => "Еженедельно",
        RepeatInterval::Monthly => "Ежемесячно",
    }
}
