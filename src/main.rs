//! Reply Helper - 终端入口
//!
//! 初始化日志、加载配置与设置、打开历史账本，然后进入逐行交互：普通文本触发生成，`/` 开头为命令。
//! 生成过程中按 Ctrl+C 取消当前生成；空闲时按 Ctrl+C 退出。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use reply_helper::config::{load_config, AppConfig};
use reply_helper::core::{
    estimate_cost, GenerationOrchestrator, GenerationOutcome, GenerationRequest,
    GenerationSupervisor, ModelId, Tone,
};
use reply_helper::llm::{CompletionClient, OpenAiClient};
use reply_helper::memory::{
    default_export_file_name, export_to_file, HistoryLedger, JsonHistoryStore, UndoSnapshot,
};
use reply_helper::observability;
use reply_helper::settings::{AppSettings, SettingsStore};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message to generate a reply. Commands:
  /tone <name>       Polite | Friendly | Professional | Casual | Formal | Empathetic
  /default-tone <name>  tone selected at startup
  /model [id]        show or set the model, e.g. gpt-4o-mini, gpt-4o
  /offline on|off    toggle offline demo mode
  /key <api-key>     set the OpenAI API key
  /undo              restore the previous input/output/tone
  /history           list past replies (newest first)
  /use <n>           load history entry n into the editor
  /clear             clear history (asks for confirmation)
  /export [path]     export history (.json or text)
  /cost              estimate cost of the current input
  /quit
Ctrl+C cancels a running generation, or exits when idle.";

/// 终端里的「编辑区」：对应桌面版的输入框、输出框与语气下拉框
#[derive(Debug, Default)]
struct Editor {
    input: String,
    output: String,
    tone: Tone,
}

impl Editor {
    fn snapshot(&self) -> UndoSnapshot {
        UndoSnapshot::new(self.input.clone(), self.output.clone(), self.tone.index())
    }

    fn restore(&mut self, snapshot: UndoSnapshot) {
        self.input = snapshot.input_text;
        self.output = snapshot.output_text;
        self.tone = Tone::from_index(snapshot.tone_index);
    }
}

fn build_client(cfg: &AppConfig, settings: &AppSettings) -> Arc<dyn CompletionClient> {
    Arc::new(OpenAiClient::from_config(&cfg.llm, settings.api_key.trim()))
}

/// 环境变量中的 Key 只在本次运行生效，不写回设置文件
fn save_settings(store: &SettingsStore, settings: &AppSettings, env_key: Option<&str>) {
    if env_key.is_some_and(|k| k == settings.api_key) {
        let mut persisted = settings.clone();
        persisted.api_key.clear();
        store.save(&persisted);
    } else {
        store.save(settings);
    }
}

/// `/name arg` 拆成 (Some(name), arg)；普通文本为 (None, 原文)
fn split_command(line: &str) -> (Option<&str>, &str) {
    match line.strip_prefix('/') {
        Some(rest) => {
            let mut parts = rest.splitn(2, ' ');
            (
                Some(parts.next().unwrap_or_default()),
                parts.next().unwrap_or_default().trim(),
            )
        }
        None => (None, line),
    }
}

/// 默认否：只有明确的 y/yes 才算确认
fn confirmed(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(std::env::args().nth(1).map(PathBuf::from)).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let settings_path = cfg.app.data_dir.join("settings.json");
    let first_run = !settings_path.exists();
    let settings_store = SettingsStore::new(&settings_path);
    let mut settings = settings_store.load();
    if first_run {
        settings.model = ModelId::new(cfg.llm.default_model.clone());
    }
    let env_key = if settings.api_key.trim().is_empty() {
        settings.resolved_api_key()
    } else {
        None
    };
    if let Some(key) = &env_key {
        settings.api_key = key.clone();
    }

    let history = HistoryLedger::open(
        JsonHistoryStore::new(cfg.app.data_dir.join("history.json")),
        cfg.app.max_history_items,
    );
    let client = build_client(&cfg, &settings);
    let mut editor = Editor {
        tone: settings.default_tone(),
        ..Editor::default()
    };
    let mut model = settings.model.clone();
    let mut orchestrator = GenerationOrchestrator::from_config(&cfg, client, history, settings);
    let supervisor = GenerationSupervisor::new();
    let shutdown = supervisor.session_token();
    {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !supervisor.cancel_current() {
                    supervisor.cancel();
                    break;
                }
            }
        });
    }

    tracing::info!(
        "{} ready ({} history entries)",
        cfg.app.name.as_deref().unwrap_or("Reply Helper"),
        orchestrator.history().len()
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = split_command(line);

        match command {
            None => {
                let before = editor.snapshot();
                editor.input = arg.to_string();
                let request = GenerationRequest::new(&editor.input, editor.tone, model.clone());

                let token = supervisor.begin();
                let mut phases = orchestrator.subscribe();
                let reporter = tokio::spawn(async move {
                    while phases.changed().await.is_ok() {
                        let status = phases.borrow_and_update().status_text();
                        if let Some(text) = status {
                            println!("… {text}");
                        }
                    }
                });

                let outcome = orchestrator.generate(&request, before, &token).await;
                supervisor.end();
                reporter.abort();

                match outcome {
                    GenerationOutcome::Success(reply) => {
                        println!("\n{reply}\n");
                        editor.output = reply;
                    }
                    GenerationOutcome::Cancelled => {
                        println!("Generation cancelled");
                        editor.output.clear();
                    }
                    GenerationOutcome::Failed(e) if e.kind.is_validation() => {
                        println!("{}", e.friendly_message());
                    }
                    GenerationOutcome::Failed(e) => {
                        println!("Generation failed: {}", e.friendly_message());
                    }
                }
            }
            Some("tone") => match arg.parse::<Tone>() {
                Ok(tone) => {
                    editor.tone = tone;
                    println!("Tone: {tone}");
                }
                Err(e) => println!("{e}"),
            },
            Some("default-tone") => match arg.parse::<Tone>() {
                Ok(tone) => {
                    orchestrator.settings_mut().default_tone = tone.index();
                    save_settings(&settings_store, orchestrator.settings(), env_key.as_deref());
                    println!("Default tone: {tone}");
                }
                Err(e) => println!("{e}"),
            },
            Some("model") if arg.is_empty() => println!("Model: {model}"),
            Some("model") => {
                model = ModelId::new(arg);
                orchestrator.settings_mut().model = model.clone();
                save_settings(&settings_store, orchestrator.settings(), env_key.as_deref());
                println!("Model: {model}");
            }
            Some("offline") => {
                let on = matches!(arg, "on" | "true" | "1");
                orchestrator.settings_mut().offline_mode = on;
                save_settings(&settings_store, orchestrator.settings(), env_key.as_deref());
                println!("Offline mode: {}", if on { "on" } else { "off" });
            }
            Some("key") if !arg.is_empty() => {
                orchestrator.settings_mut().set_api_key(arg);
                save_settings(&settings_store, orchestrator.settings(), env_key.as_deref());
                let client = build_client(&cfg, orchestrator.settings());
                orchestrator.replace_client(client);
                println!("API key saved");
            }
            Some("undo") => match orchestrator.undo() {
                Some(snapshot) => {
                    editor.restore(snapshot);
                    println!(
                        "Undo applied (tone: {}, input: {:?})",
                        editor.tone, editor.input
                    );
                }
                None => println!("Nothing to undo"),
            },
            Some("history") => {
                if orchestrator.history().is_empty() {
                    println!("No history yet. Generate some replies to see them here!");
                }
                for (i, entry) in orchestrator.history().list().iter().enumerate() {
                    println!(
                        "[{i}] {} ({}) {}\n    -> {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.tone,
                        entry.original_message,
                        entry.generated_reply
                    );
                }
            }
            Some("use") => {
                let picked = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| orchestrator.history().get(i).cloned());
                match picked {
                    Some(entry) => {
                        orchestrator.record_snapshot(editor.snapshot());
                        editor.input = entry.original_message;
                        editor.output = entry.generated_reply;
                        println!("Reply loaded from history:\n\n{}\n", editor.output);
                    }
                    None => println!("No such history entry: {arg}"),
                }
            }
            Some("clear") => {
                if orchestrator.history().is_empty() {
                    println!("History is already empty");
                    continue;
                }
                println!("Are you sure you want to clear all history? [y/N]");
                let answer = lines.next_line().await.context("Failed to read stdin")?;
                if confirmed(answer.as_deref()) {
                    orchestrator.clear_history();
                    println!("History cleared");
                } else {
                    println!("Clear aborted");
                }
            }
            Some("export") => {
                if orchestrator.history().is_empty() {
                    println!("No history to export.");
                    continue;
                }
                let path = if arg.is_empty() {
                    PathBuf::from(format!("{}.json", default_export_file_name(chrono::Local::now())))
                } else {
                    PathBuf::from(arg)
                };
                match export_to_file(orchestrator.history().list(), &path) {
                    Ok(format) => println!("History exported to {} ({:?})", path.display(), format),
                    Err(e) => {
                        tracing::error!("Export failed: {:#}", e);
                        println!("Failed to export history: {e}");
                    }
                }
            }
            Some("cost") => println!("{}", estimate_cost(&model, editor.input.chars().count())),
            Some("help") => println!("{HELP}"),
            Some("quit") | Some("exit") => break,
            Some(other) => println!("Unknown command: /{other} (try /help)"),
        }
    }

    if shutdown.is_cancelled() {
        // stdin 的阻塞读线程无法取消，等运行时关闭会卡到下一次回车
        println!();
        tracing::info!("Interrupted, exiting");
        std::process::exit(130);
    }
    Ok(())
}
