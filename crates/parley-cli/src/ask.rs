//! One-shot prompt without history

use std::io::Write;

use parley_agent::Gateway;
use parley_ai::{Completion, Message, ProviderKind, RequestOptions, pricing};

/// Send a single prompt and print the reply with its usage and cost
pub async fn run(
    gateway: &dyn Gateway,
    kind: ProviderKind,
    prompt: &str,
    options: &RequestOptions,
    out: &mut impl Write,
) -> anyhow::Result<Completion> {
    let completion = gateway.send(&[Message::user(prompt)], options).await?;

    writeln!(out, "{}", completion.text)?;
    writeln!(out)?;
    writeln!(
        out,
        "Model: {} | Tokens: {} in / {} out | Cost: {}",
        completion.model,
        completion.usage.input,
        completion.usage.output,
        pricing::cost(kind, &completion.model, completion.usage)
    )?;

    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EchoGateway;

    #[tokio::test]
    async fn test_ask_prints_usage_and_cost() {
        let gateway = EchoGateway::default();
        let options = RequestOptions {
            model: Some("deepseek-chat".into()),
            ..Default::default()
        };
        let mut out = Vec::new();

        let completion = run(&gateway, ProviderKind::DeepSeek, "2+2?", &options, &mut out)
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(completion.text, "echo:2+2?");
        assert!(out.starts_with("echo:2+2?\n"));
        assert!(out.contains("Model: deepseek-chat | Tokens: 10 in / 5 out | Cost: $0.000008"));
    }

    #[tokio::test]
    async fn test_ask_propagates_failure() {
        let gateway = EchoGateway::failing_on(1);
        let result = run(
            &gateway,
            ProviderKind::DeepSeek,
            "hi",
            &RequestOptions::default(),
            &mut Vec::new(),
        )
        .await;
        assert!(result.is_err());
    }
}
