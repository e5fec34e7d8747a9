use redis::Script;
use std::sync::LazyLock;

pub const ROW_INSERT_SCRIPT_BODY: &str = include_str!("../../lua/row_insert.lua");
pub const ROW_PATCH_SCRIPT_BODY: &str = include_str!("../../lua/row_patch.lua");
pub const ROW_SOFT_DELETE_SCRIPT_BODY: &str = include_str!("../../lua/row_soft_delete.lua");
pub const COUNTER_RECONCILE_SCRIPT_BODY: &str = include_str!("../../lua/counter_reconcile.lua");

pub static ROW_INSERT_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ROW_INSERT_SCRIPT_BODY));
pub static ROW_PATCH_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ROW_PATCH_SCRIPT_BODY));
pub static ROW_SOFT_DELETE_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ROW_SOFT_DELETE_SCRIPT_BODY));
pub static COUNTER_RECONCILE_SCRIPT: LazyLock<Script> =
    LazyLock::new(|| Script::new(COUNTER_RECONCILE_SCRIPT_BODY));
