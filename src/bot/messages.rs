//! Every user-visible bot message, in one place.
//!
//! The bot speaks Persian to its recipients. Keeping the strings out of the
//! handler keeps the dialogue logic readable and makes wording changes a
//! one-file affair.

pub const PROMPT_NATIONAL_ID: &str = "سلام! لطفاً کد ملی خود را وارد کنید:";

pub const MALFORMED_NATIONAL_ID: &str = "کد ملی باید ده رقم باشد. لطفاً دوباره وارد کنید:";

pub const UNKNOWN_NATIONAL_ID: &str =
    "کد ملی وارد شده در فهرست کارکنان یافت نشد. لطفاً دوباره تلاش کنید.";

pub const PROMPT_PERSONNEL: &str = "لطفاً شماره پرسنلی خود را وارد کنید:";

pub const PERSONNEL_MISMATCH: &str =
    "شماره پرسنلی با کد ملی مطابقت ندارد. برای شروع دوباره /start را بفرستید.";

pub const NOT_REGISTERED: &str = "شما هنوز ثبت‌نام نکرده‌اید. برای شروع /start را بفرستید.";

pub const NO_RECORDS: &str = "برای این کد ملی سابقه‌ای یافت نشد.";

pub const COOLDOWN: &str =
    "فیش حقوقی شما به‌تازگی ارسال شده است. لطفاً بعداً دوباره تلاش کنید.";

pub const HELP: &str = "دستورات: /start برای ثبت‌نام، /payslip برای دریافت فیش حقوقی.";

/// Registration confirmation, echoing the verified national id.
pub fn registered(national_id: &str) -> String {
    format!("کد ملی {national_id} ثبت شد. شناسه چت شما ذخیره گردید.")
}
