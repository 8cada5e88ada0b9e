use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

use orchard_core::OrchardError;
use orchard_core::achievement::{CounterSnapshot, progress_with_threshold};
use orchard_core::catalog::{
    AchievementCatalog, AchievementDefinition, AchievementPanel, UnlockRecord,
};
use orchard_core::growth::apply_event;
use orchard_core::reward::{RewardInventory, convert};
use orchard_core::tree::stage_of;
use serde::{Deserialize, Serialize};

/// Stable return codes for C/Swift/Kotlin callers.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchardFfiCode {
    Ok = 0,
    InvalidArgument = 1,
    RuntimeError = 2,
}

/// Owned byte buffer returned across the FFI boundary.
///
/// Ownership:
/// - Producer: Rust allocates (`Box<[u8]>`) and returns pointer/len.
/// - Consumer: Calls `orchard_owned_bytes_free` exactly once.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OrchardOwnedBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl OrchardOwnedBytes {
    const fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
        }
    }

    fn from_vec(value: Vec<u8>) -> Self {
        if value.is_empty() {
            return Self::empty();
        }
        let boxed = value.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed).cast::<u8>();
        Self { ptr, len }
    }
}

/// Uniform response envelope for every exported call. The payload is always
/// JSON: the result on success, an error payload otherwise.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct OrchardFfiResult {
    pub code: OrchardFfiCode,
    pub payload: OrchardOwnedBytes,
}

impl OrchardFfiResult {
    fn ok_json_bytes(payload: Vec<u8>) -> Self {
        Self {
            code: OrchardFfiCode::Ok,
            payload: OrchardOwnedBytes::from_vec(payload),
        }
    }

    fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        let payload = FfiArgumentErrorPayload {
            code: "INVALID_ARGUMENT",
            operation,
            message: message.into(),
        };
        Self::json_or_internal(OrchardFfiCode::InvalidArgument, operation, &payload)
    }

    fn engine_error(operation: &'static str, err: &OrchardError) -> Self {
        let code = match err {
            OrchardError::InvalidInput(_)
            | OrchardError::UnknownCondition(_)
            | OrchardError::Validation(_)
            | OrchardError::Json(_)
            | OrchardError::Toml(_) => OrchardFfiCode::InvalidArgument,
            _ => OrchardFfiCode::RuntimeError,
        };
        Self::json_or_internal(code, operation, &err.to_payload(operation))
    }

    fn internal_error(operation: &'static str, message: impl Into<String>) -> Self {
        let payload = FfiArgumentErrorPayload {
            code: "FFI_INTERNAL",
            operation,
            message: message.into(),
        };
        Self::json_or_internal(OrchardFfiCode::RuntimeError, operation, &payload)
    }

    fn json_or_internal(
        code: OrchardFfiCode,
        operation: &'static str,
        payload: &impl Serialize,
    ) -> Self {
        match serde_json::to_vec(payload) {
            Ok(json) => Self {
                code,
                payload: OrchardOwnedBytes::from_vec(json),
            },
            Err(err) => {
                let fallback = format!(
                    r#"{{"code":"FFI_INTERNAL","operation":"{operation}","message":"failed to serialize payload: {err}"}}"#
                )
                .into_bytes();
                Self {
                    code: OrchardFfiCode::RuntimeError,
                    payload: OrchardOwnedBytes::from_vec(fallback),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct FfiArgumentErrorPayload<'a> {
    code: &'static str,
    operation: &'a str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ConversionPayload {
    point_total: i64,
    inventory: RewardInventory,
    stage: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StageRequest {
    tier1_count: u64,
    tier2_count: u64,
    tier3_count: u64,
    tier4_count: u64,
    total_base_units: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PanelRequest {
    #[serde(default)]
    definitions: Option<Vec<AchievementDefinition>>,
    #[serde(default)]
    unlocks: Vec<UnlockRecord>,
    #[serde(default)]
    counters: CounterSnapshot,
}

#[unsafe(no_mangle)]
/// Convert a point total into its apple inventory and tree stage.
///
/// # Safety
/// - The returned payload must be released with `orchard_owned_bytes_free`.
pub unsafe extern "C" fn orchard_convert_json(point_total: i64) -> OrchardFfiResult {
    const OPERATION: &str = "reward.convert";

    match convert(point_total) {
        Ok(inventory) => json_success(
            OPERATION,
            &ConversionPayload {
                point_total,
                inventory,
                stage: stage_of(&inventory).index(),
            },
        ),
        Err(err) => OrchardFfiResult::engine_error(OPERATION, &err),
    }
}

#[unsafe(no_mangle)]
/// Compute the tree stage for an inventory given as JSON tier counts.
///
/// # Safety
/// - `inventory_json` must point to a valid NUL-terminated UTF-8 string.
/// - The returned payload must be released with `orchard_owned_bytes_free`.
pub unsafe extern "C" fn orchard_stage_json(inventory_json: *const c_char) -> OrchardFfiResult {
    const OPERATION: &str = "tree.stage";

    let raw = match parse_required_c_string(inventory_json, OPERATION, "inventory_json") {
        Ok(value) => value,
        Err(result) => return result,
    };
    let request: StageRequest = match parse_json_argument(&raw, OPERATION) {
        Ok(value) => value,
        Err(result) => return result,
    };

    let inventory = match RewardInventory::from_counts(
        request.tier1_count,
        request.tier2_count,
        request.tier3_count,
        request.tier4_count,
    ) {
        Ok(inventory) => inventory,
        Err(err) => return OrchardFfiResult::engine_error(OPERATION, &err),
    };
    if let Some(total) = request
        .total_base_units
        .filter(|total| *total != inventory.total_base_units)
    {
        return OrchardFfiResult::engine_error(
            OPERATION,
            &OrchardError::InvalidInput(format!(
                "total_base_units {total} does not match tier counts ({})",
                inventory.total_base_units
            )),
        );
    }

    let stage = stage_of(&inventory);
    json_success(
        OPERATION,
        &serde_json::json!({
            "stage": stage.index(),
            "stage_name": stage.name(),
        }),
    )
}

#[unsafe(no_mangle)]
/// Apply one scored event to a growth level.
///
/// # Safety
/// - The returned payload must be released with `orchard_owned_bytes_free`.
pub unsafe extern "C" fn orchard_apply_growth_json(
    current_level: i64,
    event_points: i64,
) -> OrchardFfiResult {
    const OPERATION: &str = "growth.apply_event";

    match apply_event(current_level, event_points) {
        Ok(level) => json_success(OPERATION, &serde_json::json!({ "growth_level": level })),
        Err(err) => OrchardFfiResult::engine_error(OPERATION, &err),
    }
}

#[unsafe(no_mangle)]
/// Project achievement progress for a condition key against JSON counters.
/// A non-negative `points_required` is the point threshold used for keys
/// without a built-in rule; pass a negative value for none.
///
/// # Safety
/// - `condition_key` and `counters_json` must point to valid NUL-terminated UTF-8 strings.
/// - The returned payload must be released with `orchard_owned_bytes_free`.
pub unsafe extern "C" fn orchard_progress_json(
    condition_key: *const c_char,
    counters_json: *const c_char,
    points_required: i64,
) -> OrchardFfiResult {
    const OPERATION: &str = "achievement.progress";

    let condition = match parse_c_string_allow_empty(condition_key, OPERATION, "condition_key") {
        Ok(value) => value,
        Err(result) => return result,
    };
    let raw = match parse_required_c_string(counters_json, OPERATION, "counters_json") {
        Ok(value) => value,
        Err(result) => return result,
    };
    let counters: CounterSnapshot = match parse_json_argument(&raw, OPERATION) {
        Ok(value) => value,
        Err(result) => return result,
    };

    let threshold = u64::try_from(points_required).ok();
    let progress = progress_with_threshold(condition.trim(), threshold, &counters);
    json_success(
        OPERATION,
        &serde_json::json!({
            "progress": progress,
            "percent": progress.percent(),
        }),
    )
}

#[unsafe(no_mangle)]
/// Build the achievement panel from a JSON request of
/// `{definitions?, unlocks, counters}`. Omitted definitions use the built-in catalog.
///
/// # Safety
/// - `request_json` must point to a valid NUL-terminated UTF-8 string.
/// - The returned payload must be released with `orchard_owned_bytes_free`.
pub unsafe extern "C" fn orchard_panel_json(request_json: *const c_char) -> OrchardFfiResult {
    const OPERATION: &str = "achievement.panel";

    let raw = match parse_required_c_string(request_json, OPERATION, "request_json") {
        Ok(value) => value,
        Err(result) => return result,
    };
    let request: PanelRequest = match parse_json_argument(&raw, OPERATION) {
        Ok(value) => value,
        Err(result) => return result,
    };

    let definitions = request
        .definitions
        .unwrap_or_else(|| AchievementCatalog::default().achievements);
    let panel = AchievementPanel::build(&definitions, &request.unlocks, &request.counters);
    json_success(OPERATION, &panel)
}

#[unsafe(no_mangle)]
/// Free JSON payload memory returned by FFI calls.
///
/// # Safety
/// - `bytes` must be a value returned by this crate.
/// - The value must be freed exactly once.
pub unsafe extern "C" fn orchard_owned_bytes_free(bytes: OrchardOwnedBytes) {
    if bytes.ptr.is_null() || bytes.len == 0 {
        return;
    }
    // SAFETY: pointer/len come from `OrchardOwnedBytes::from_vec`, which uses `Box<[u8]>`.
    unsafe {
        let slice_ptr = ptr::slice_from_raw_parts_mut(bytes.ptr, bytes.len);
        drop(Box::from_raw(slice_ptr));
    }
}

fn parse_required_c_string(
    raw: *const c_char,
    operation: &'static str,
    field: &'static str,
) -> std::result::Result<String, OrchardFfiResult> {
    let value = parse_c_string_allow_empty(raw, operation, field)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(OrchardFfiResult::invalid_argument(
            operation,
            format!("{field} must be non-empty"),
        ));
    }
    Ok(value.to_string())
}

fn parse_c_string_allow_empty(
    raw: *const c_char,
    operation: &'static str,
    field: &'static str,
) -> std::result::Result<String, OrchardFfiResult> {
    if raw.is_null() {
        return Err(OrchardFfiResult::invalid_argument(
            operation,
            format!("{field} pointer is null"),
        ));
    }

    // SAFETY: `raw` is checked for null and expected to be a NUL-terminated C string.
    let c_str = unsafe { CStr::from_ptr(raw) };
    c_str.to_str().map(str::to_string).map_err(|err| {
        OrchardFfiResult::invalid_argument(operation, format!("{field} must be valid UTF-8: {err}"))
    })
}

fn parse_json_argument<T: for<'de> Deserialize<'de>>(
    raw: &str,
    operation: &'static str,
) -> std::result::Result<T, OrchardFfiResult> {
    serde_json::from_str(raw)
        .map_err(|err| OrchardFfiResult::engine_error(operation, &OrchardError::Json(err)))
}

fn json_success(operation: &'static str, payload: &impl Serialize) -> OrchardFfiResult {
    match serde_json::to_vec(payload) {
        Ok(payload) => OrchardFfiResult::ok_json_bytes(payload),
        Err(err) => OrchardFfiResult::internal_error(
            operation,
            format!("json encode failed for {operation}: {err}"),
        ),
    }
}
