//! Forecast command implementation

use anyhow::{bail, Result};
use budgetwise_core::{AIClient, BudgetStore, ForecastPipeline, Session};

use super::format_money;

pub async fn cmd_forecast(
    store: &BudgetStore,
    session: &Session,
    ai: Option<AIClient>,
    horizon: &str,
) -> Result<()> {
    let user_id = session.require_user()?;
    let Some(client) = ai else {
        bail!("AI backend not configured. Set OLLAMA_HOST (or AI_BACKEND=mock) to enable forecasts.");
    };

    let info = client.info();
    println!("🤖 Forecasting {} with {} ({})...", horizon, info.model, info.backend);

    let history = store.transactions(session, user_id, None)?;
    let pipeline = ForecastPipeline::new(client);
    let result = pipeline.run(user_id, &history, horizon).await?;

    println!();
    println!("🔮 Predicted spending for {}", result.horizon);
    println!("   ─────────────────────────────");
    for (category, amount) in &result.predicted_spending {
        println!("   {:<13} {:>14}", category, format_money(*amount));
    }
    println!();
    println!("   Confidence: {}", result.confidence);
    if !result.explanation.is_empty() {
        println!("   {}", result.explanation);
    }

    Ok(())
}
