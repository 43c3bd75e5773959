//! Send one prompt to several models, providers or temperatures and compare them

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parley_agent::Gateway;
use parley_ai::{Completion, Message, ProviderKind, RequestOptions, pricing};

use crate::utils::truncate_chars;

/// YandexGPT models compared when none are given
pub const DEFAULT_YANDEX_MODELS: &[&str] = &[
    "yandexgpt-lite/latest",
    "yandexgpt/latest",
    "yandexgpt/rc",
    "aliceai-llm/latest",
];

const PREVIEW_CHARS: usize = 300;

/// A provider taking part in a comparison, with the models to ask
pub struct Contender {
    pub kind: ProviderKind,
    pub gateway: Arc<dyn Gateway>,
    pub models: Vec<String>,
}

/// Outcome of one request
pub struct ModelRun {
    pub kind: ProviderKind,
    pub model: String,
    /// Swept temperature; `None` outside a sweep
    pub temperature: Option<f32>,
    pub elapsed: Duration,
    pub result: parley_ai::Result<Completion>,
}

impl ModelRun {
    /// Model name, with the temperature when one was set for this run
    pub fn label(&self) -> String {
        match self.temperature {
            Some(t) => format!("{} @ {:.1}", self.model, t),
            None => self.model.clone(),
        }
    }
}

/// Models the user asked for: `--models` wins, then the global `--model`.
/// Empty means "use the provider's default set".
pub fn requested_models(models: Vec<String>, global: Option<String>) -> Vec<String> {
    if models.is_empty() {
        global.into_iter().collect()
    } else {
        models
    }
}

/// Models to compare: the given list, or a provider-specific default
pub fn models_for(kind: ProviderKind, requested: &[String]) -> Vec<String> {
    if !requested.is_empty() {
        return requested.to_vec();
    }
    match kind {
        ProviderKind::YandexGpt => DEFAULT_YANDEX_MODELS.iter().map(|m| m.to_string()).collect(),
        ProviderKind::DeepSeek => vec!["deepseek-chat".into(), "deepseek-reasoner".into()],
        ProviderKind::Claude => vec![kind.default_model().to_string()],
    }
}

/// Send `prompt` to every contender's models at every temperature,
/// concurrently.
///
/// Runs come back grouped by temperature, then in contender and model
/// order. Without `temperatures` each model is asked once with the
/// temperature from `options`.
pub async fn run_all(
    contenders: &[Contender],
    prompt: &str,
    temperatures: &[f32],
    options: &RequestOptions,
) -> Vec<ModelRun> {
    let messages = [Message::user(prompt)];
    let sweep: Vec<Option<f32>> = if temperatures.is_empty() {
        vec![None]
    } else {
        temperatures.iter().copied().map(Some).collect()
    };

    let mut runs = Vec::new();
    for &temperature in &sweep {
        for contender in contenders {
            for model in &contender.models {
                let options = RequestOptions {
                    model: Some(model.clone()),
                    temperature: temperature.or(options.temperature),
                    ..options.clone()
                };
                let messages = &messages;
                runs.push(async move {
                    let start = Instant::now();
                    let result = contender.gateway.send(messages, &options).await;
                    ModelRun {
                        kind: contender.kind,
                        model: options.model.unwrap_or_default(),
                        temperature,
                        elapsed: start.elapsed(),
                        result,
                    }
                });
            }
        }
    }

    join_all(runs).await
}

/// Mean reply length in characters per temperature, in the order the
/// temperatures first appear. Failed runs are left out; a temperature with
/// no successful run has no average.
pub fn average_lengths(runs: &[ModelRun]) -> Vec<(Option<f32>, Option<usize>)> {
    let mut temperatures: Vec<Option<f32>> = Vec::new();
    for run in runs {
        if !temperatures.contains(&run.temperature) {
            temperatures.push(run.temperature);
        }
    }

    temperatures
        .into_iter()
        .map(|temperature| {
            let lengths: Vec<usize> = runs
                .iter()
                .filter(|r| r.temperature == temperature)
                .filter_map(|r| r.result.as_ref().ok())
                .map(|c| c.text.chars().count())
                .collect();
            let average = (!lengths.is_empty()).then(|| lengths.iter().sum::<usize>() / lengths.len());
            (temperature, average)
        })
        .collect()
}

/// Print a results table followed by each reply, and average reply
/// lengths when several temperatures were tried
pub fn report(out: &mut impl Write, runs: &[ModelRun]) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<10} {:<30} {:>8} {:>8} {:>8} {:>14}",
        "Provider", "Model", "Time", "Input", "Output", "Cost"
    )?;
    writeln!(out, "{}", "-".repeat(83))?;

    for run in runs {
        match &run.result {
            Ok(completion) => writeln!(
                out,
                "{:<10} {:<30} {:>7.2}s {:>8} {:>8} {:>14}",
                run.kind.id(),
                run.label(),
                run.elapsed.as_secs_f64(),
                completion.usage.input,
                completion.usage.output,
                pricing::cost(run.kind, &run.model, completion.usage).to_string()
            )?,
            Err(e) => writeln!(out, "{:<10} {:<30} failed: {}", run.kind.id(), run.label(), e)?,
        }
    }

    for run in runs {
        if let Ok(completion) = &run.result {
            writeln!(out)?;
            writeln!(out, "[{}]", run.label())?;
            writeln!(out, "{}", truncate_chars(&completion.text, PREVIEW_CHARS))?;
        }
    }

    let averages = average_lengths(runs);
    if averages.len() > 1 {
        writeln!(out)?;
        writeln!(out, "Average reply length:")?;
        for (temperature, average) in averages {
            let temperature = temperature.map_or_else(|| "default".to_string(), |t| format!("{:.1}", t));
            match average {
                Some(chars) => writeln!(out, "  temperature {}: {} characters", temperature, chars)?,
                None => writeln!(out, "  temperature {}: no replies", temperature)?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EchoGateway;
    use std::sync::atomic::Ordering;

    fn contender(kind: ProviderKind, gateway: Arc<EchoGateway>, models: &[&str]) -> Contender {
        Contender {
            kind,
            gateway,
            models: models.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_models_for() {
        assert_eq!(models_for(ProviderKind::YandexGpt, &[]).len(), 4);
        assert_eq!(
            models_for(ProviderKind::YandexGpt, &["yandexgpt/rc".to_string()]),
            vec!["yandexgpt/rc".to_string()]
        );
        assert_eq!(
            models_for(ProviderKind::Claude, &[]),
            vec![ProviderKind::Claude.default_model().to_string()]
        );
    }

    #[test]
    fn test_global_model_narrows_comparison() {
        let requested = requested_models(Vec::new(), Some("yandexgpt/rc".into()));
        assert_eq!(models_for(ProviderKind::YandexGpt, &requested), vec!["yandexgpt/rc"]);

        let requested = requested_models(vec!["a".into(), "b".into()], Some("ignored".into()));
        assert_eq!(requested, vec!["a", "b"]);

        assert!(requested_models(Vec::new(), None).is_empty());
    }

    #[tokio::test]
    async fn test_run_all_keeps_model_order() {
        let gateway = Arc::new(EchoGateway::default());
        let contenders = [contender(ProviderKind::YandexGpt, gateway.clone(), DEFAULT_YANDEX_MODELS)];

        let runs = run_all(&contenders, "Hello", &[], &RequestOptions::default()).await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 4);
        let names: Vec<&str> = runs.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(names, DEFAULT_YANDEX_MODELS);
        for run in &runs {
            assert_eq!(run.result.as_ref().unwrap().model, run.model);
            assert_eq!(run.temperature, None);
        }
    }

    #[tokio::test]
    async fn test_run_all_across_providers() {
        let claude = Arc::new(EchoGateway::default());
        let deepseek = Arc::new(EchoGateway::failing_on(1));
        let contenders = [
            contender(ProviderKind::Claude, claude.clone(), &["claude-sonnet-4-5"]),
            contender(ProviderKind::DeepSeek, deepseek.clone(), &["deepseek-chat"]),
        ];

        let runs = run_all(&contenders, "Hi", &[], &RequestOptions::default()).await;

        assert_eq!(claude.calls.load(Ordering::SeqCst), 1);
        assert_eq!(deepseek.calls.load(Ordering::SeqCst), 1);
        assert_eq!(runs[0].kind, ProviderKind::Claude);
        assert!(runs[0].result.is_ok());
        assert_eq!(runs[1].kind, ProviderKind::DeepSeek);
        assert!(runs[1].result.is_err());

        let mut out = Vec::new();
        report(&mut out, &runs).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("claude"));
        assert!(out.contains("deepseek   deepseek-chat"));
        assert!(out.contains("failed: "));
        assert!(out.contains("[claude-sonnet-4-5]\necho:Hi"));
        assert!(!out.contains("Average reply length"));
    }

    #[tokio::test]
    async fn test_temperature_sweep() {
        let gateway = Arc::new(EchoGateway::default());
        let contenders = [contender(ProviderKind::DeepSeek, gateway.clone(), &["deepseek-chat"])];

        let runs = run_all(&contenders, "Hello", &[0.0, 0.5, 1.0], &RequestOptions::default()).await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
        let temperatures: Vec<Option<f32>> = runs.iter().map(|r| r.temperature).collect();
        assert_eq!(temperatures, vec![Some(0.0), Some(0.5), Some(1.0)]);
        assert_eq!(runs[1].label(), "deepseek-chat @ 0.5");

        let averages = average_lengths(&runs);
        assert_eq!(averages.len(), 3);
        // "echo:Hello"
        assert!(averages.iter().all(|(_, avg)| *avg == Some(10)));

        let mut out = Vec::new();
        report(&mut out, &runs).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Average reply length:"));
        assert!(out.contains("  temperature 0.5: 10 characters"));
    }

    #[tokio::test]
    async fn test_average_skips_failures() {
        let gateway = Arc::new(EchoGateway::failing_on(1));
        let contenders = [contender(ProviderKind::DeepSeek, gateway, &["deepseek-chat"])];

        // Only the first request fails
        let mut runs = run_all(&contenders, "Hi", &[0.0], &RequestOptions::default()).await;
        runs.extend(run_all(&contenders, "Hello", &[1.0], &RequestOptions::default()).await);

        assert_eq!(average_lengths(&runs), vec![(Some(0.0), None), (Some(1.0), Some(10))]);

        let mut out = Vec::new();
        report(&mut out, &runs).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("  temperature 0.0: no replies"));
    }

    #[tokio::test]
    async fn test_report_shows_failures() {
        let gateway = Arc::new(EchoGateway::failing_on(1));
        let contenders = [contender(ProviderKind::YandexGpt, gateway, &["yandexgpt-lite/latest"])];
        let mut runs = run_all(&contenders, "Hi", &[], &RequestOptions::default()).await;
        runs.extend(run_all(&contenders, "Hi", &[], &RequestOptions::default()).await);

        let mut out = Vec::new();
        report(&mut out, &runs).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("failed: "));
        assert!(out.contains("0.0030 ₽"));
        assert!(out.contains("[yandexgpt-lite/latest]\necho:Hi"));
    }
}
