use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use aura_core::credit::{self, CompanyApplication, FinancialRatiosInput};

use crate::input;
use crate::session::{report_audit, Session};

/// Loan application fields shared by every command that scores a borrower.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ApplicationArgs {
    /// Path to JSON application file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Legal name of the borrower
    #[arg(long)]
    pub company: Option<String>,

    /// Industry sector, e.g. "IT Services" or "Energy"
    #[arg(long)]
    pub industry: Option<String>,

    /// Annual revenue in $M
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Requested loan amount in $M
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Loan purpose, e.g. "Working Capital"
    #[arg(long)]
    pub purpose: Option<String>,

    /// Years in business
    #[arg(long, alias = "years")]
    pub years_in_business: Option<i64>,

    /// Number of employees
    #[arg(long)]
    pub employees: Option<i64>,
}

impl ApplicationArgs {
    /// Missing flags stay `None` so validation reports them all at once.
    pub fn application(&self) -> Result<CompanyApplication, Box<dyn std::error::Error>> {
        input::resolve(self.input.as_deref(), || {
            Ok(CompanyApplication {
                company_name: self.company.clone(),
                industry: self.industry.clone(),
                revenue: self.revenue,
                loan_amount: self.loan_amount,
                purpose: self.purpose.clone(),
                years_in_business: self.years_in_business,
                employees: self.employees,
            })
        })
    }
}

/// Arguments for the headline ratio screen
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RatiosArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// EBITDA
    #[arg(long)]
    pub ebitda: Option<Decimal>,

    /// Annual debt service (principal plus interest)
    #[arg(long)]
    pub debt_service: Option<Decimal>,

    /// Total debt
    #[arg(long)]
    pub total_debt: Option<Decimal>,

    /// EBIT
    #[arg(long)]
    pub ebit: Option<Decimal>,

    /// Interest expense
    #[arg(long)]
    pub interest_expense: Option<Decimal>,
}

pub fn run_analyze(
    args: ApplicationArgs,
    session: &Session,
) -> Result<Value, Box<dyn std::error::Error>> {
    let identity = session.authenticate()?;
    let application = args.application()?;

    let mut desk = session.desk();
    let analysis = desk.analyze(&identity, &application, Utc::now())?;
    report_audit(&analysis.audit);
    Ok(serde_json::to_value(analysis.value)?)
}

pub fn run_ratios(args: RatiosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ratios_input: FinancialRatiosInput = input::resolve(args.input.as_deref(), || {
        Ok(FinancialRatiosInput {
            ebitda: args.ebitda.ok_or("--ebitda is required (or provide --input)")?,
            debt_service: args
                .debt_service
                .ok_or("--debt-service is required (or provide --input)")?,
            total_debt: args
                .total_debt
                .ok_or("--total-debt is required (or provide --input)")?,
            ebit: args.ebit.ok_or("--ebit is required (or provide --input)")?,
            interest_expense: args
                .interest_expense
                .ok_or("--interest-expense is required (or provide --input)")?,
        })
    })?;

    let result = credit::calculate_ratios(&ratios_input)?;
    Ok(serde_json::to_value(result)?)
}
