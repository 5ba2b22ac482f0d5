//! `scanner scan`: submit a job to a running service and poll it to completion.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::bootstrap::CliContext;
use crate::error::CliError;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct AggregateStatus {
    status: String,
}

const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub async fn execute(ctx: &CliContext, service_url: &str, username: &str, password: &str, git_url: &str) -> Result<(), CliError> {
    let submit_url = format!("{service_url}/scan");
    let submitted: SubmitResponse = ctx
        .http
        .post(&submit_url)
        .basic_auth(username, Some(password))
        .json(&json!({ "git_url": git_url }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!("submitted job {}", submitted.job_id);

    let status_url = format!("{service_url}/scan/{}", submitted.job_id);
    loop {
        let aggregate: AggregateStatus = ctx
            .http
            .get(&status_url)
            .basic_auth(username, Some(password))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        println!("status: {}", aggregate.status);

        if is_terminal_status(&aggregate.status) {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let results_url = format!("{service_url}/jobs/{}/results", submitted.job_id);
    let results: serde_json::Value = ctx
        .http
        .get(&results_url)
        .basic_auth(username, Some(password))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!("{}", serde_json::to_string_pretty(&results).unwrap_or_default());
    Ok(())
}

fn is_terminal_status(status: &str) -> bool {
    matches!(
        status,
        "completed" | "completed_with_errors" | "all_failed" | "failed" | "timeout" | "cancelled"
    )
}
