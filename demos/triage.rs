//! Handoff demo: a triage agent routing to sales or refunds, streamed.
//!
//! Requires `OPENAI_API_KEY` (a `.env` file works too).

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use murmur::prelude::*;

const MODEL: &str = "gpt-4o-mini";

fn handoff_tool(name: &'static str, description: &'static str, target: Agent) -> FunctionTool {
    FunctionTool::new(name, description, ToolParameters::empty(), move |_args, _ctx| {
        let target = target.clone();
        async move { Ok(ToolReturn::from(target)) }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let sales = Agent::new("Sales Agent", MODEL)
        .with_instructions("Be super enthusiastic about selling bees.");
    let refunds = Agent::new("Refunds Agent", MODEL).with_instructions(
        "Help the user with a refund. If the reason is that it was too expensive, \
         offer the user a discount code instead.",
    );

    let triage = Agent::new("Triage Agent", MODEL)
        .with_instructions(
            "Determine which agent is best suited to handle the user's request, \
             and transfer the conversation to that agent.",
        )
        .with_tool(Arc::new(handoff_tool(
            "transfer_to_sales",
            "Transfer to the sales agent.",
            sales,
        )))
        .with_tool(Arc::new(handoff_tool(
            "transfer_to_refunds",
            "Transfer to the refunds agent.",
            refunds,
        )));

    let orchestrator = Orchestrator::new(ProviderKind::OpenAi)?;
    let mut stream = orchestrator.run_stream(
        triage,
        vec![Message::user("I want a refund, my bees never arrived.")],
        ContextVariables::new(),
        RunOptions::default(),
    );

    while let Some(item) = stream.next().await {
        match item? {
            StreamItem::TurnStart => print!("\n> "),
            StreamItem::Delta(delta) => {
                if let Some(content) = delta.content {
                    print!("{content}");
                    std::io::stdout().flush().ok();
                }
            }
            StreamItem::TurnEnd => println!(),
            StreamItem::Done(response) => {
                let agent = response.agent.map(|a| a.name().to_string());
                println!("\nfinal agent: {}", agent.as_deref().unwrap_or("none"));
            }
        }
    }

    Ok(())
}
