//! Tool round-trip demo: a weather agent with a stubbed lookup.
//!
//! Requires `OPENAI_API_KEY` (a `.env` file works too).

use std::sync::Arc;

use murmur::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let get_weather = FunctionTool::new(
        "get_weather",
        "Get the current weather for a location.",
        ToolParameters::object()
            .string("location", "City name", true)
            .build(),
        |args, _ctx| async move {
            let location = args.get_str("location")?.to_string();
            Ok(ToolReturn::from(format!("It's sunny in {location}.")))
        },
    );

    let agent = Agent::new("Weather Agent", "gpt-4o-mini")
        .with_instructions("You are a helpful weather assistant.")
        .with_tool(Arc::new(get_weather));

    let orchestrator = Orchestrator::new(ProviderKind::OpenAi)?;
    let response = orchestrator
        .run(
            agent,
            vec![Message::user("What's the weather like in Paris?")],
            ContextVariables::new(),
            RunOptions::default(),
        )
        .await?;

    for message in &response.messages {
        let speaker = message.sender.as_deref().unwrap_or("tool");
        println!("[{speaker}] {}", message.text());
    }

    Ok(())
}
