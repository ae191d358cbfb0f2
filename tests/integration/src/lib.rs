//! End-to-end tests for the sapcli XML codec.
//!
//! The scenarios build realistic ADT and abapGit documents from a shared
//! schema registry and run them through the public API only.
//!
//! Run them with:
//! ```text
//! cargo test -p sapcli-integration
//! ```

use std::sync::{Arc, Once, OnceLock};

use sapcli_xml::{RecordType, RowType, SchemaRegistry, TableType, XmlError};

static INIT: Once = Once::new();
static REGISTRY: OnceLock<Arc<SchemaRegistry>> = OnceLock::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// The process-wide schema shared by all scenarios.
///
/// # Panics
/// Panics if the built-in schema is inconsistent.
#[must_use]
pub fn registry() -> Arc<SchemaRegistry> {
    init_tracing();
    Arc::clone(REGISTRY.get_or_init(|| {
        Arc::new(build_registry().expect("built-in schema must be consistent"))
    }))
}

fn build_registry() -> Result<SchemaRegistry, XmlError> {
    let progdir = RecordType::builder("PROGDIR")
        .scalar("NAME")
        .scalar("STATE")
        .scalar("VARCL")
        .scalar("DBAPL")
        .scalar("DBNA")
        .scalar("SUBC")
        .scalar("FIXPT")
        .scalar("LDBNAME")
        .scalar("UCCHECK")
        .build()?;

    let textpool = RecordType::builder("TEXTPOOL")
        .scalar("ID")
        .scalar("KEY")
        .scalar("ENTRY")
        .scalar("LENGTH")
        .build()?;
    let tpool = TableType::itemized("TPOOL", RowType::record(&textpool))?;

    let devc = RecordType::builder("DEVC").scalar("CTEXT").build()?;

    let include = RecordType::builder("INCLUDE")
        .scalar("NAME")
        .scalar("TYPE")
        .build()?;
    let includes = TableType::ordered("INCLUDES", RowType::record(&include))?;
    let messages = TableType::itemized("MESSAGES", RowType::scalar("STRING")?)?;
    let check_run = RecordType::builder("CHECK_RUN")
        .scalar("OBJECT")
        .scalar("STATUS")
        .table("INCLUDES", &includes)
        .table("MESSAGES", &messages)
        .build()?;

    Ok(SchemaRegistry::builder()
        .register(&progdir)?
        .register(&tpool)?
        .register(&devc)?
        .register(&check_run)?
        .build())
}

mod test_generic;
mod test_interchange;
