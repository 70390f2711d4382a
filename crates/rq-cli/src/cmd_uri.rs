use std::path::PathBuf;

use anyhow::Result;

use rq_client::{QueryClient, SortDirection};
use rq_config::RqConfig;
use rq_client::tracing_init::init_tracing;

pub struct UriArgs {
    pub config: PathBuf,
    pub resource: String,
    pub filter: Vec<String>,
    pub order_by: Vec<String>,
    pub desc: bool,
    pub select: Vec<String>,
    pub expand: Vec<String>,
    pub top: Option<u32>,
    pub skip: Option<u32>,
    pub json: bool,
}

pub fn run(args: UriArgs) -> Result<()> {
    let config_path = args
        .config
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("config path '{}': {e}", args.config.display()))?;
    let config = RqConfig::load(&config_path)?;
    let _guard = init_tracing(&config.logging, &config.base_dir)?;

    let client = QueryClient::from_config(config).map_err(|e| anyhow::anyhow!("{e}"))?;
    let direction = if args.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    let mut query = client
        .query(&args.resource)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    for f in args.filter {
        query = query.filter(f);
    }
    for o in args.order_by {
        query = query.order(o, direction);
    }
    for s in args.select {
        query = query.select(s);
    }
    for e in args.expand {
        query = query.expand(e);
    }
    if let Some(n) = args.top {
        query = query.top(n);
    }
    if let Some(n) = args.skip {
        query = query.skip(n);
    }

    let uri = query.to_uri().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(domain = "sys", resource = %args.resource, "uri composed");

    if args.json {
        let params = query.params().map_err(|e| anyhow::anyhow!("{e}"))?;
        let options: serde_json::Map<String, serde_json::Value> = params
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
            .collect();
        let out = serde_json::json!({
            "resource": args.resource,
            "uri": uri,
            "options": options,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{uri}");
    }
    Ok(())
}
