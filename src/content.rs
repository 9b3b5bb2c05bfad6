//! Static localized texts shown by the bot.
//!
//! Everything here is data. Routing never matches on these strings; it
//! works on [`ActionId`]s and the session state.

use crate::menu::ActionId;
use crate::session::Language;

/// A text available in every supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Localized {
    pub ru: &'static str,
    pub kz: &'static str,
}

impl Localized {
    pub const fn new(ru: &'static str, kz: &'static str) -> Self {
        Self { ru, kz }
    }

    pub fn get(&self, language: Language) -> &'static str {
        match language {
            Language::Ru => self.ru,
            Language::Kz => self.kz,
        }
    }
}

/// An informational page reached from the menu.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub text: Localized,
    /// Buttons attached under the page, in display order.
    pub buttons: &'static [ActionId],
}

pub const WELCOME: &str = "👶 <b>Добро пожаловать в MyHelperBot!</b>\n\n\
✨ Я помогу вам с заботой, профессионализмом и теплом.\n\n\
Выберите язык / Тілді таңдаңыз:";

pub const LANGUAGE_RU_LABEL: &str = "🇷🇺 Русский";
pub const LANGUAGE_KZ_LABEL: &str = "🇰🇿 Қазақша";

pub const PROFILE_PROMPT: Localized = Localized::new("🌸 Кто вы?", "🌸 Кімсіз?");

pub const PROFILE_PARENT_LABEL: Localized = Localized::new("🤱 Я мама", "🤱 Мен анамын");
pub const PROFILE_EXPECTANT_LABEL: Localized = Localized::new("🤰 Беременная", "🤰 Жүктімін");
pub const PROFILE_SPECIALIST_LABEL: Localized = Localized::new("🩺 Специалист", "🩺 Маман");

pub const PROFILE_SAVED: Localized = Localized::new(
    "✅ Профиль сохранён. Главное меню:",
    "✅ Профиль сақталды. Басты мәзір:",
);

pub const MAIN_MENU: Localized = Localized::new("📋 Главное меню:", "📋 Басты мәзір:");

pub const INTRO: Localized = Localized::new(
    "<b>👩‍⚕ Жуманова Мерей Насірханқызы</b>\n\n\
Врач-неонатолог с опытом более 13 лет.\n\
🔹 Реанимация, хирургия, роды, недоношенные дети.\n\
👶 Более 18 000 малышей прошли через её руки.\n\n\
<i>«Вы не одна. Я рядом, чтобы помочь вам понять малыша — с первых минут жизни и дальше.»</i>\n\n\
📩 Заполните анкету — и я подберу для вас формат помощи.",
    "<b>👩‍⚕ Жуманова Мерей Насірханқызы</b>\n\n\
13 жылдан астам тәжірибесі бар неонатолог дәрігер.\n\
🔹 Реанимация, хирургия, босану, шала туған балалар.\n\
👶 18 000-нан астам сәби оның қолынан өтті.\n\n\
<i>«Сіз жалғыз емессіз. Мен сәбиіңізді алғашқы минуттан бастап түсінуге көмектесемін.»</i>\n\n\
📩 Сауалнаманы толтырыңыз — мен сізге көмек форматын таңдаймын.",
);

/// Buttons attached under the automatic introduction.
pub const INTRO_BUTTONS: &[ActionId] = &[ActionId::Form, ActionId::MainMenu];

pub const FORM_START: Localized =
    Localized::new("📝 Давайте начнём анкету!", "📝 Сауалнаманы бастайық!");

pub const FORM_DONE: Localized = Localized::new(
    "✅ Спасибо! Анкета получена. Мы свяжемся с вами в течение 24 часов.",
    "✅ Рахмет! Сауалнама қабылданды. Біз сізбен 24 сағат ішінде байланысамыз.",
);

pub const FORM_NOT_SAVED: Localized = Localized::new(
    "⚠ К сожалению, не удалось сохранить анкету. Пожалуйста, попробуйте позже или напишите нам в контакты.",
    "⚠ Өкінішке орай, сауалнаманы сақтау мүмкін болмады. Кейінірек қайталаңыз немесе бізге жазыңыз.",
);

pub const FALLBACK: Localized = Localized::new(
    "ℹ Пожалуйста, используйте меню ниже.",
    "ℹ Төмендегі мәзірді пайдаланыңыз.",
);

pub const REJECT_EMPTY: Localized = Localized::new(
    "❗ Пожалуйста, введите корректный ответ.",
    "❗ Дұрыс жауап енгізіңіз.",
);

pub const REJECT_DATE: Localized = Localized::new(
    "❗ Введите дату в формате ДД.ММ.ГГГГ, например 05.03.2024.",
    "❗ Күнді КК.АА.ЖЖЖЖ форматында енгізіңіз, мысалы 05.03.2024.",
);

pub const REJECT_TOO_LONG: Localized = Localized::new(
    "❗ Ответ слишком длинный. Максимум символов:",
    "❗ Жауап тым ұзын. Ең көп таңба саны:",
);

/// `Шаг 2 из 7` / `Қадам 2 / 7`.
pub fn progress_line(language: Language, current: usize, total: usize) -> String {
    match language {
        Language::Ru => format!("📊 Шаг {current} из {total}"),
        Language::Kz => format!("📊 Қадам {current} / {total}"),
    }
}

const ABOUT_DOCTOR: Page = Page {
    text: Localized::new(
        "<b>👩‍⚕ Жуманова Мерей Насірханқызы</b>\n\n\
Врач-неонатолог с опытом 13+ лет.\n\
Реанимация, хирургия, ГВ, адаптация, патология.\n\
👶 18 000 малышей. 100% включённость.\n\n\
<i>«Вы не одна. Я рядом, чтобы помочь вам понять малыша — с первых минут жизни и дальше.»</i>",
        "<b>👩‍⚕ Жуманова Мерей Насірханқызы</b>\n\n\
13+ жыл тәжірибесі бар неонатолог дәрігер.\n\
Реанимация, хирургия, емізу, бейімделу, патология.\n\
👶 18 000 сәби. 100% қатысу.\n\n\
<i>«Сіз жалғыз емессіз. Мен сәбиіңізді алғашқы минуттан бастап түсінуге көмектесемін.»</i>",
    ),
    buttons: &[ActionId::Form, ActionId::MainMenu],
};

const CONTACTS: Page = Page {
    text: Localized::new(
        "📱 Контакты:\n\n\
WhatsApp: +7 771 147 10 34\n\
Telegram: @merey_neonatologist\n\
Канал: https://t.me/+ohgaSD3VEQc5MGZi",
        "📱 Байланыс:\n\n\
WhatsApp: +7 771 147 10 34\n\
Telegram: @merey_neonatologist\n\
Арна: https://t.me/+ohgaSD3VEQc5MGZi",
    ),
    buttons: &[ActionId::MainMenu],
};

const COURSES: Page = Page {
    text: Localized::new(
        "📚 Курсы:\n\n\
👶 0–3 мес — грудное вскармливание, колики, желтуха\n\
👶 3–6 мес — развитие, массаж, перевороты\n\
🌡 Температура и иммунитет — без лекарств\n\n\
📩 Все курсы содержат видеоуроки, инструкции и поддержку.",
        "📚 Курстар:\n\n\
👶 0–3 ай — емізу, іш қату, сарғаю\n\
👶 3–6 ай — даму, массаж, аунау\n\
🌡 Қызба және иммунитет — дәрісіз\n\n\
📩 Барлық курстарда бейне сабақтар, нұсқаулықтар және қолдау бар.",
    ),
    buttons: &[ActionId::MainMenu],
};

const SERVICES: Page = Page {
    text: Localized::new(
        "🩺 Консультации:\n\n\
📞 Онлайн: 2ч видеозвонок + 7 дней поддержки\n\
🏡 Оффлайн: выезд на дом + 7 дней сопровождения\n\n\
⚠ Подходит мамам с трудностями ГВ, ЖКТ, срыгиваниями, коликами.\n\
📩 Начните с анкеты, чтобы подобрать формат.",
        "🩺 Кеңестер:\n\n\
📞 Онлайн: 2 сағ бейне қоңырау + 7 күн қолдау\n\
🏡 Офлайн: үйге бару + 7 күн сүйемелдеу\n\n\
⚠ Емізу, асқазан-ішек, құсу, іш қату қиындықтары бар аналарға.\n\
📩 Форматты таңдау үшін сауалнамадан бастаңыз.",
    ),
    buttons: &[ActionId::Form, ActionId::MainMenu],
};

const DOULA: Page = Page {
    text: Localized::new(
        "🤱 Подготовка к родам:\n\n\
🔹 Что взять в роддом и как понять, что пора\n\
🔹 Первые часы малыша: прикладывание, осмотр, адаптация\n\
🔹 Сопровождение доулы и поддержка после выписки\n\n\
📩 Заполните анкету, чтобы подобрать формат подготовки.",
        "🤱 Босануға дайындық:\n\n\
🔹 Перзентханаға не алу керек және уақыт келгенін қалай түсінуге болады\n\
🔹 Сәбидің алғашқы сағаттары: емізу, тексеру, бейімделу\n\
🔹 Доула сүйемелдеуі және шыққаннан кейінгі қолдау\n\n\
📩 Дайындық форматын таңдау үшін сауалнаманы толтырыңыз.",
    ),
    buttons: &[ActionId::Form, ActionId::MainMenu],
};

const MENTORSHIP: Page = Page {
    text: Localized::new(
        "🌟 Наставничество:\n\n\
🔹 Для врачей, медсестёр и акушерок\n\
🔹 10 уроков, 1 месяц, поддержка, разбор кейсов\n\
🔹 Темы: грудное вскармливание, Доула, желтуха, уход за НР\n\n\
📩 Хочешь зарабатывать и не выгорать? Начни с анкеты!",
        "🌟 Тәлімгерлік:\n\n\
🔹 Дәрігерлер, мейірбикелер және акушерлер үшін\n\
🔹 10 сабақ, 1 ай, қолдау, кейстерді талдау\n\
🔹 Тақырыптар: емізу, доула, сарғаю, жаңа туған нәрестеге күтім\n\n\
📩 Табыс тауып, шаршамағыңыз келе ме? Сауалнамадан бастаңыз!",
    ),
    buttons: &[ActionId::Form, ActionId::MainMenu],
};

/// Informational page for a menu action. `Form` and `MainMenu` are
/// handled by the router and have no page.
pub fn page(action: ActionId) -> Option<&'static Page> {
    match action {
        ActionId::AboutDoctor => Some(&ABOUT_DOCTOR),
        ActionId::Contacts => Some(&CONTACTS),
        ActionId::Courses => Some(&COURSES),
        ActionId::Services => Some(&SERVICES),
        ActionId::Doula => Some(&DOULA),
        ActionId::Mentorship => Some(&MENTORSHIP),
        ActionId::Form | ActionId::MainMenu => None,
    }
}
