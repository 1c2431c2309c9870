use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use codejudge::config::CliArgs;
use codejudge::create_timestamp;
use codejudge::judge::{Judge, ProblemTestSets, TestCase, Verdict};
use codejudge::sandbox::{LanguageId, probe_toolchains};

/// A submission file: either explicit `test_cases`, or a problem's hidden and sample sets
#[derive(Deserialize)]
struct SubmissionFile {
    code: String,
    language: LanguageId,
    #[serde(default)]
    test_cases: Option<Vec<TestCase>>,
    #[serde(flatten)]
    problem: ProblemTestSets,
}

#[derive(Serialize)]
struct JudgedFile {
    file: PathBuf,
    judged_time: String,
    verdict: Verdict,
}

fn read_submission(path: &Path) -> Result<SubmissionFile> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Unable to open submission {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Invalid submission {}", path.display()))
}

async fn judge_file(judge: Arc<Judge>, path: PathBuf) -> Result<JudgedFile> {
    let submission = read_submission(&path)?;
    log::info!(
        "Judging {} ({})",
        path.display(),
        submission.language
    );

    let verdict = match &submission.test_cases {
        Some(cases) => {
            judge
                .judge(&submission.code, &submission.language, cases)
                .await
        }
        None => {
            judge
                .judge_problem(&submission.code, &submission.language, &submission.problem)
                .await
        }
    };

    Ok(JudgedFile {
        file: path,
        judged_time: create_timestamp(),
        verdict,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let config = cli.to_config()?;

    let statuses = probe_toolchains(&config);
    for status in &statuses {
        match &status.path {
            Some(path) => log::info!(
                "{} toolchain {}: {}",
                status.language,
                status.tool,
                path.display()
            ),
            None => log::warn!("{} toolchain {} not found", status.language, status.tool),
        }
    }

    if cli.check_toolchains {
        for status in &statuses {
            println!("{}", serde_json::to_string(status)?);
        }
        return Ok(());
    }

    if cli.submissions.is_empty() {
        bail!("No submission files given");
    }

    let judge = Arc::new(Judge::new(config));
    let mut tasks = JoinSet::new();
    for path in cli.submissions {
        tasks.spawn(judge_file(judge.clone(), path));
    }

    let mut failed = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-c received, aborting {} submissions...", tasks.len());
                // Dropped runners kill their children and remove their workspaces
                tasks.shutdown().await;
                bail!("Judging interrupted");
            }
            next = tasks.join_next() => {
                let Some(res) = next else { break };
                match res {
                    Ok(Ok(judged)) => println!("{}", serde_json::to_string(&judged)?),
                    Ok(Err(e)) => {
                        failed += 1;
                        log::error!("{e:#}");
                    }
                    Err(e) => {
                        failed += 1;
                        log::error!("Judging task failed: {:?}", e);
                    }
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} submission(s) could not be judged");
    }
    Ok(())
}
