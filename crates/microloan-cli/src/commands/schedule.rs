use chrono::NaiveDate;
use clap::Args;
use serde_json::{json, Value};

use microloan_core::config::ProductConfig;
use microloan_core::pricing;
use microloan_core::repayment;
use microloan_core::validation;

use super::quote::SelectionArgs;

/// Arguments for building a repayment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Disbursement date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub disbursed_on: Option<NaiveDate>,

    /// Amount already repaid, for the outstanding balance
    #[arg(long)]
    pub repaid: Option<rust_decimal::Decimal>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &ProductConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.selection.request()?;
    validation::validate(request.principal, request.term_days, &config.bounds)?;
    let quote = pricing::compute_quote(&request, &config.pricing)?;

    let disbursed_on = args
        .disbursed_on
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let schedule = repayment::build_schedule(&quote, disbursed_on)?;

    let mut value = json!({
        "disbursed_on": schedule.disbursed_on,
        "final_due_date": schedule.final_due_date,
        "total_due": schedule.total_due,
        "results": schedule.installments,
    });
    if let Some(repaid) = args.repaid {
        value["outstanding_balance"] =
            json!(repayment::outstanding_balance(schedule.total_due, repaid)?);
        value["progress_pct"] =
            json!(repayment::repayment_progress(schedule.total_due, repaid)?.round_dp(1));
    }
    Ok(value)
}
