//! Scripted walk through the five wizard steps against the canned backend.
//! Prints what an advisor would see on each screen.

use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use mihogar::domain::GraceType;
use mihogar::error::AppError;
use mihogar::gateway::{CustomerId, InstitutionId, PropertyId};
use mihogar::workflows::simulation::SimulationWizard;

use crate::infra::CannedBackend;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Customer to simulate for
    #[arg(long, default_value = "cust-001")]
    pub(crate) customer: String,
    /// Property to simulate against
    #[arg(long, default_value = "prop-001")]
    pub(crate) property: String,
    /// Cash contribution toward the down payment, in soles
    #[arg(long, default_value = "5000")]
    pub(crate) contribution: Decimal,
    /// Requested annual interest rate, in percent
    #[arg(long, default_value = "7.5")]
    pub(crate) rate: String,
    /// Loan term in months
    #[arg(long, default_value_t = 240)]
    pub(crate) term: u32,
    /// Grace period in months (0 disables it)
    #[arg(long, default_value_t = 0)]
    pub(crate) grace_months: u32,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = Arc::new(CannedBackend::default());
    let mut wizard = SimulationWizard::start(Arc::clone(&backend)).await?;

    println!("== Step 1: client and property ==");
    let customer_id = CustomerId::new(args.customer);
    let property_id = PropertyId::new(args.property);
    wizard.select_customer(&customer_id).await?;
    wizard.select_property(&property_id).await?;
    let view = wizard.view();
    if let Some(customer) = &view.customer {
        println!("client: {} ({})", customer.full_name, customer.monthly_income);
    }
    if let Some(property) = &view.property {
        println!("property: {} at {}", property.property_code, property.price);
    }
    if let Some(snapshot) = &view.eligibility {
        for bono in snapshot.mivivienda.eligible_bonos() {
            if let Some(amount) = bono.amount {
                println!("eligible bono: {} for PEN {amount}", bono.bono_type);
            }
        }
    }
    wizard.advance()?;

    println!("\n== Step 2: initial payment ==");
    wizard.set_contribution(args.contribution)?;
    let totals = wizard.totals();
    println!("cash contribution: {}", totals.user_contribution);
    println!("subsidies: {}", totals.total_bonos);
    println!("total initial payment: {}", totals.total_initial_payment);
    println!("loan amount: {}", totals.loan_amount);
    wizard.advance()?;

    println!("\n== Step 3: rate and institution ==");
    wizard.set_interest_rate(&args.rate).await?;
    let view = wizard.view();
    for institution in &view.institutions {
        println!(
            "offering {}%: {} ({}% - {}%)",
            args.rate, institution.institution_name, institution.min_rate, institution.max_rate
        );
    }
    let first = view
        .institutions
        .first()
        .map(|i| i.institution_id.clone())
        .unwrap_or_else(|| InstitutionId::new("inst-001"));
    wizard.select_institution(&first).await?;
    wizard.advance()?;

    println!("\n== Step 4: term and grace ==");
    wizard.set_term(args.term);
    if args.grace_months > 0 {
        wizard.set_grace_period(args.grace_months, GraceType::Partial);
    }
    println!("term: {} months, grace: {} months", args.term, args.grace_months);

    println!("\n== Step 5: results ==");
    let simulation = wizard.generate().await?.clone();
    if let Some(plan) = &simulation.payment_plan {
        println!("simulation {}", simulation.id);
        println!("monthly payment: {}", plan.monthly_payment);
        println!("tcea: {}", plan.tcea);
        println!("installments: {}", plan.installments.len());
    }
    println!("expires: {}", simulation.expires_at.format("%Y-%m-%d"));

    let saved = wizard.save().await?;
    println!("saved simulation {} ({})", saved.id, saved.status);
    Ok(())
}
