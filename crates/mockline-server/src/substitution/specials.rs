//! Special keys (`*...`) that change status, headers or delay instead of body text.

use super::{DELAY_KEY, HEADER_PREFIX, STATUS_CODE_KEY};
use crate::call::Call;
use crate::flatten::ScalarValue;

/// Status codes accepted by `*HTTP_STATUS_CODE`.
pub const KNOWN_STATUS_CODES: [u16; 63] = [
    100, 101, 102, 103, 200, 201, 202, 203, 204, 205, 206, 207, 208, 226, 300, 301, 302, 303,
    304, 305, 306, 307, 308, 400, 401, 402, 403, 404, 405, 406, 407, 408, 409, 410, 411, 412,
    413, 414, 415, 416, 417, 418, 421, 422, 423, 424, 425, 426, 428, 429, 431, 451, 500, 501,
    502, 503, 504, 505, 506, 507, 508, 510, 511,
];

pub fn is_known_status(code: i64) -> bool {
    u16::try_from(code)
        .map(|c| KNOWN_STATUS_CODES.contains(&c))
        .unwrap_or(false)
}

/// Apply a special key to `variant_id` with an already formatted value.
///
/// Each `(variant, key)` pair is applied at most once per call.
pub(crate) fn apply_special(call: &mut Call, variant_id: &str, key: &str, value: &str) {
    let track_key = format!("{variant_id}_{key}");
    if call.is_claimed(&track_key) {
        call.trace.info(format!(
            "Special param {key} has already been assigned. Skipping new assignment"
        ));
        return;
    }

    if key.eq_ignore_ascii_case(DELAY_KEY) {
        call.set_delay(variant_id, value);
        call.claim(&track_key);
        return;
    }

    if key.eq_ignore_ascii_case(STATUS_CODE_KEY) {
        let code = ScalarValue::from(value).to_i64();
        if !is_known_status(code) {
            call.trace.info(format!(
                "HTTP STATUS_CODE skipped due to invalid code {code}"
            ));
            return;
        }
        match call.variant_mut(variant_id) {
            Some(variant) => {
                variant.status_override = u16::try_from(code).ok();
                call.trace
                    .info(format!("HTTP STATUS_CODE set to {code} for {variant_id}"));
                call.claim(&track_key);
            }
            None => call
                .trace
                .error(format!("HTTP STATUS_CODE skipped. Unknown response {variant_id}")),
        }
        return;
    }

    let header_name = key
        .get(..HEADER_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(HEADER_PREFIX))
        .and_then(|_| key.get(HEADER_PREFIX.len()..))
        .filter(|name| !name.is_empty());
    if let Some(name) = header_name {
        call.trace.info(format!("Setting HEADER {name} {value}"));
        match call.variant_mut(variant_id) {
            Some(variant) => {
                variant.headers.insert(name.to_string(), value.to_string());
                call.claim(&track_key);
            }
            None => call
                .trace
                .error(format!("HEADER {name} skipped. Unknown response {variant_id}")),
        }
        return;
    }

    call.trace
        .info(format!("Special param {key} is not recognised. Ignored"));
}
