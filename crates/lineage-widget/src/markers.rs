//! Abstract marker blueprints

use std::sync::LazyLock;

use lineage_core::Blueprint;

static BASE_ABSTRACT: LazyLock<Blueprint> = LazyLock::new(|| Blueprint::marker("BaseAbstract", None));

static WIDGET_ABSTRACT: LazyLock<Blueprint> =
    LazyLock::new(|| Blueprint::marker("WidgetAbstract", Some(base_abstract())));

/// Foundation for objects that run the lifecycle sequence on creation
pub fn base_abstract() -> &'static Blueprint {
    &BASE_ABSTRACT
}

/// Foundation for widgets; delegates to [`base_abstract`]
pub fn widget_abstract() -> &'static Blueprint {
    &WIDGET_ABSTRACT
}
