use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "sf444view=warn",
        1 => "sf444view=info",
        2 => "sf444view=debug",
        _ => "sf444view=trace",
    }
}

/// Initialize logging to stderr. `RUST_LOG` directives are honoured in
/// addition to the verbosity level. Stdout stays reserved for the table.
pub fn init_logging(verbosity: u8, json: bool) {
    let filter = match directive_for(verbosity).parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    // a second init (tests, embedding) keeps the existing subscriber
    let _ = result;
}
