//! mortgage-sim CLI
//!
//! Command-line interface for French-method amortization schedules with
//! prepayment simulation

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use mortgage_schedule::export::{schedule_rows, write_csv, write_xlsx, ScheduleRow};
use mortgage_schedule::{
    chart, AdHocPrepayments, AmortizationSchedule, LoanTerms, Money, PeriodicPrepayments,
    SafeTimeProvider, TimeSource,
};

#[derive(Parser)]
#[command(
    name = "mortgage-sim",
    version,
    about = "French-method mortgage amortization simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct LoanArgs {
    /// loan principal, in thousands of base units (UF)
    #[arg(long)]
    principal: Decimal,

    /// annual nominal rate, in percent
    #[arg(long)]
    rate: Decimal,

    /// term in months
    #[arg(long)]
    months: u32,

    /// start date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    start_date: Option<String>,
}

#[derive(Args)]
struct PlanArgs {
    /// annual prepayment limit, in thousands of base units
    #[arg(long)]
    annual_limit: Decimal,

    /// prepayment frequency in months, 6 (semiannual) or 12 (annual)
    #[arg(long)]
    frequency: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Amortization schedule, optionally with ad-hoc prepayments
    Summary {
        #[command(flatten)]
        loan: LoanArgs,

        /// ad-hoc prepayments as 'period:amount,period:amount', amounts in
        /// thousands of base units
        #[arg(long)]
        prepayments: Option<String>,

        /// stem for the .csv/.xlsx/.png artifacts
        #[arg(long, default_value = "mortgage_summary")]
        output: String,
    },
    /// Periodic prepayment plan with an annual budget
    Plan {
        #[command(flatten)]
        loan: LoanArgs,

        #[command(flatten)]
        plan: PlanArgs,

        /// stem for the .csv/.xlsx/.png artifacts
        #[arg(long, default_value = "mortgage_prepayment_plan")]
        output: String,
    },
    /// Compare schedules with and without periodic prepayments
    Compare {
        #[command(flatten)]
        loan: LoanArgs,

        #[command(flatten)]
        plan: PlanArgs,

        /// print the two summaries as JSON instead of text
        #[arg(long)]
        json: bool,

        /// stem for the comparison .png artifact
        #[arg(long, default_value = "mortgage_comparison")]
        output: String,
    },
}

fn main() {
    env_logger::init();

    // all failures terminate this invocation with a report, never a panic
    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let time = SafeTimeProvider::new(TimeSource::System);

    match cli.command {
        Command::Summary {
            loan,
            prepayments,
            output,
        } => {
            let terms = build_terms(&loan, &time)?;
            let schedule = match prepayments.as_deref() {
                Some(spec) => {
                    let prepayments = AdHocPrepayments::parse(spec)?;
                    AmortizationSchedule::generate(&terms, &prepayments)?
                }
                None => AmortizationSchedule::baseline(&terms)?,
            };

            print_schedule(&schedule);
            print_summary(&schedule);
            write_artifacts(&schedule, &output)?;
        }
        Command::Plan { loan, plan, output } => {
            let terms = build_terms(&loan, &time)?;
            let policy = periodic_policy(&plan)?;
            let schedule = AmortizationSchedule::generate(&terms, &policy)?;

            print_schedule(&schedule);
            print_summary(&schedule);
            write_artifacts(&schedule, &output)?;
        }
        Command::Compare {
            loan,
            plan,
            json,
            output,
        } => {
            let terms = build_terms(&loan, &time)?;
            let baseline = AmortizationSchedule::baseline(&terms)?;
            let policy = periodic_policy(&plan)?;
            let prepaid = AmortizationSchedule::generate(&terms, &policy)?;

            let chart_path = PathBuf::from(format!("{output}.png"));
            chart::render_comparison_chart(&baseline, &prepaid, &chart_path)?;

            if json {
                let value = serde_json::json!({
                    "baseline": baseline.summary,
                    "with_prepayment": prepaid.summary,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_comparison(&baseline, &prepaid);
            }
            println!("\nComparison chart written to: {}", chart_path.display());
        }
    }

    Ok(())
}

fn build_terms(loan: &LoanArgs, time: &SafeTimeProvider) -> anyhow::Result<LoanTerms> {
    Ok(LoanTerms::from_inputs(
        loan.principal,
        loan.rate,
        loan.months,
        loan.start_date.as_deref(),
        time,
    )?)
}

fn periodic_policy(plan: &PlanArgs) -> anyhow::Result<PeriodicPrepayments> {
    Ok(PeriodicPrepayments::new(
        Money::from_thousands(plan.annual_limit),
        plan.frequency,
    )?)
}

const HEAD_ROWS: usize = 24;
const TAIL_ROWS: usize = 5;

fn print_schedule(schedule: &AmortizationSchedule) {
    let rows = schedule_rows(schedule);

    println!("\nAmortization schedule (thousands of units):");
    println!(
        "{:>6} {:>12} {:>12} {:>14} {:>12} {:>14} {:>12} {:>12} {:>14}",
        "Period",
        "Due date",
        "Principal",
        "Cum principal",
        "Interest",
        "Cum interest",
        "Total",
        "Prepayment",
        "Balance"
    );
    println!("{}", "-".repeat(116));

    if rows.len() > HEAD_ROWS + TAIL_ROWS {
        for row in &rows[..HEAD_ROWS] {
            print_row(row);
        }
        println!("... ({} more rows)", rows.len() - HEAD_ROWS - TAIL_ROWS);
        for row in &rows[rows.len() - TAIL_ROWS..] {
            print_row(row);
        }
    } else {
        for row in &rows {
            print_row(row);
        }
    }
}

fn print_row(row: &ScheduleRow) {
    println!(
        "{:>6} {:>12} {:>12} {:>14} {:>12} {:>14} {:>12} {:>12} {:>14}",
        row.period,
        row.due_date.to_string(),
        row.principal,
        row.cumulative_principal,
        row.interest,
        row.cumulative_interest,
        row.total_paid,
        row.prepayment,
        row.balance
    );
}

fn print_summary(schedule: &AmortizationSchedule) {
    let summary = &schedule.summary;

    println!("\nSummary:");
    println!("  Months used: {}", summary.months_used);
    println!("  Months saved: {}", summary.months_saved);
    println!(
        "  Interest saved (thousands): {}",
        summary.interest_saved.to_thousands()
    );
    println!(
        "  Final monthly payment (thousands): {}",
        summary.final_monthly_payment.to_thousands()
    );
    println!(
        "  Total interest paid (thousands): {}",
        summary.total_interest_paid.to_thousands()
    );
    println!(
        "  Total principal paid (thousands): {}",
        summary.total_principal_paid.to_thousands()
    );
}

fn print_comparison(baseline: &AmortizationSchedule, prepaid: &AmortizationSchedule) {
    println!("\nScenario comparison (thousands of units):");
    println!("Without prepayment:");
    println!(
        "  Total interest paid: {}",
        baseline.summary.total_interest_paid.to_thousands()
    );
    println!(
        "  Total principal paid: {}",
        baseline.summary.total_principal_paid.to_thousands()
    );
    println!("With prepayment:");
    println!(
        "  Total interest paid: {}",
        prepaid.summary.total_interest_paid.to_thousands()
    );
    println!("  Months saved: {}", prepaid.summary.months_saved);
    println!(
        "  Interest saved: {}",
        prepaid.summary.interest_saved.to_thousands()
    );
}

fn write_artifacts(schedule: &AmortizationSchedule, stem: &str) -> anyhow::Result<()> {
    let csv_path = PathBuf::from(format!("{stem}.csv"));
    write_csv(schedule, &csv_path)?;
    println!("\nSchedule exported to: {}", csv_path.display());

    let xlsx_path = PathBuf::from(format!("{stem}.xlsx"));
    write_xlsx(schedule, &xlsx_path)?;

    let chart_path = PathBuf::from(format!("{stem}.png"));
    chart::render_schedule_chart(schedule, &chart_path)?;
    println!("Chart written to: {}", chart_path.display());

    Ok(())
}
