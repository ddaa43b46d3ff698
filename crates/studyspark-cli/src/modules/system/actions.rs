use reqwest::Method;

use crate::cli_args::RequestArgs;
use crate::modules::system::http::ApiRequest;
use crate::modules::system::CommandContext;

pub(crate) async fn handle_request_command(
    args: RequestArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(args.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid http method: {}", args.method))?;
    let mut request = ApiRequest::new(method, args.path);
    if let Some(data) = args.data.as_deref() {
        let body = serde_json::from_str(data)
            .map_err(|err| anyhow::anyhow!("--data is not valid JSON: {err}"))?;
        request = request.with_json(body);
    }
    let response = ctx.session.api().send(request).await.map_err(|err| {
        tracing::warn!(attempts = err.attempts(), "request failed");
        err
    })?;
    tracing::debug!(status = %response.status, "request completed");
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}
