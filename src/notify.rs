//! Payslip delivery: summary text, then the source document.
//!
//! Dispatch is one-shot: the text goes first, then the PDF as a document
//! upload. Either send failing ends the dispatch with an error; nothing is
//! retried here. A field the extraction never found renders as "—" rather
//! than being dropped, so the summary layout is stable across payslips.

use crate::error::RelayError;
use crate::record::StoredRecord;
use crate::transport::Transport;
use tracing::info;

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("—")
}

/// The human-readable summary sent ahead of the document.
pub fn summary_text(record: &StoredRecord) -> String {
    let p = &record.payslip;
    format!(
        "فیش حقوقی {month} {year}\n\
         نام: {name} {family}\n\
         کد ملی: {national_id}\n\
         شماره پرسنلی: {personnel}\n\
         کارکرد عادی: {working_days}\n\
         حقوق پایه: {base_salary}\n\
         حق مسکن: {housing}\n\
         خواروبار: {food_allowance}\n\
         حقوق و مزایا: {gross}\n\
         بیمه سهم کارمند: {insurance}\n\
         هزینه غذا: {food_expense}\n\
         جمع کسور: {deductions}\n\
         خالص پرداختی: {net} ریال",
        month = field(&p.month),
        year = field(&p.year),
        name = field(&p.name),
        family = field(&p.family_name),
        national_id = field(&p.national_id),
        personnel = field(&p.personnel_number),
        working_days = field(&p.working_days),
        base_salary = field(&p.base_salary),
        housing = field(&p.housing_allowance),
        food_allowance = field(&p.food_allowance),
        gross = field(&p.gross_salary),
        insurance = field(&p.employee_insurance),
        food_expense = field(&p.food_expense),
        deductions = field(&p.total_deductions),
        net = field(&p.net_payment),
    )
}

/// Caption attached to the document upload.
pub fn caption(record: &StoredRecord) -> String {
    format!(
        "فیش حقوقی {} {}",
        field(&record.payslip.month),
        field(&record.payslip.year)
    )
}

/// Deliver one record to one chat: summary first, then the document.
pub async fn dispatch<T: Transport>(
    transport: &T,
    chat_id: i64,
    record: &StoredRecord,
) -> Result<(), RelayError> {
    transport.send_text(chat_id, &summary_text(record)).await?;
    transport
        .send_document(chat_id, &record.source_file, &caption(record))
        .await?;
    info!(chat_id, record = record.id, "payslip delivered");
    Ok(())
}
