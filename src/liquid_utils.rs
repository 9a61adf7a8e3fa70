use crate::{
    error::{
        AlmanacError, FileIdentifier, IOAction, IOSnafu, JoinSnafu, LiquidAction, LiquidSnafu,
        ThreadReason,
    },
    liquid_utils::partials::{init_partials, PARTIALS},
};
use axum::response::Html;
use liquid::{Object, ParserBuilder};
use snafu::ResultExt;
use std::{fmt::Debug, path::Path};
use tokio::fs::read_to_string;

pub mod partials;

pub async fn compile(
    path: impl AsRef<Path> + Debug,
    globals: Object,
    instance_name: &str,
) -> Result<Html<String>, AlmanacError> {
    compile_with_newtitle(path, globals, instance_name, None).await
}

#[instrument(skip(globals, instance_name))]
pub async fn compile_with_newtitle(
    path: impl AsRef<Path> + Debug,
    mut globals: Object,
    instance_name: &str,
    html_title: Option<String>,
) -> Result<Html<String>, AlmanacError> {
    let liquid = read_to_string(&path).await.context(IOSnafu {
        action: IOAction::ReadingFile(FileIdentifier::PB(path.as_ref().to_path_buf())),
    })?;

    globals.insert(
        liquid::model::KString::from_static("instance_name"),
        liquid::model::Value::scalar(instance_name.to_string()),
    );
    globals.insert(
        liquid::model::KString::from_static("html_title"),
        liquid::model::Value::scalar(html_title.unwrap_or_else(|| instance_name.to_string())),
    );

    let partial_compiler = PARTIALS.get_or_init(init_partials).await.to_compiler();

    tokio::task::spawn_blocking(move || {
        ParserBuilder::with_stdlib()
            .partials(partial_compiler)
            .build()
            .context(LiquidSnafu {
                attempt: LiquidAction::BuildingCompiler,
            })?
            .parse(&liquid)
            .with_context(|_| LiquidSnafu {
                attempt: LiquidAction::Parsing {
                    text: liquid.clone(),
                },
            })?
            .render(&globals)
            .context(LiquidSnafu {
                attempt: LiquidAction::Rendering,
            })
    })
    .await
    .context(JoinSnafu {
        title: ThreadReason::LiquidCompiler,
    })?
    .map(Html)
}
