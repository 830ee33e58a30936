//! Wire codec: serializes and deserializes the tagged request/response
//! messages.
//!
//! Layout: `[BasicTask u32][DetailTask u32][CallerProxyId u64][ArgCount u16]
//! ArgEntry*`, where `ArgEntry = [TypeTag u16][Length u32][Payload …]`.
//! Factory requests append `[NewIdCount u16][ProxyId u64]*`.
//!
//! Serialize errors are programmer errors (an argument tuple too large to
//! represent, say) and are fatal-abort. Deserialize errors mean the stream
//! has desynchronized from what this codec expects and are fatal-abort too:
//! there is no way to resume framing once an `ArgEntry` length lies.

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io::Cursor;

use crate::error::{fatal, FramingFault};
use crate::ids::ProxyId;
use crate::message::{ArgValue, IdentifiablePointer, Request, Response};
use crate::task::{BasicTask, DetailTask};
use crate::x509::Status;

/// Fixed header size: BasicTask(4) + DetailTask(4) + CallerProxyId(8) + ArgCount(2).
const HEADER_SIZE: usize = 4 + 4 + 8 + 2;
/// Per-entry fixed overhead: TypeTag(2) + Length(4).
const ENTRY_OVERHEAD: usize = 2 + 4;

fn write_entry(buf: &mut Vec<u8>, arg: &ArgValue) {
    buf.write_u16::<BE>(arg.type_tag()).expect("Vec write never fails");
    match arg {
        ArgValue::Unit => {
            buf.write_u32::<BE>(0).unwrap();
        }
        ArgValue::U8(v) => {
            buf.write_u32::<BE>(1).unwrap();
            buf.write_u8(*v).unwrap();
        }
        ArgValue::U32(v) => {
            buf.write_u32::<BE>(4).unwrap();
            buf.write_u32::<BE>(*v).unwrap();
        }
        ArgValue::U64(v) => {
            buf.write_u32::<BE>(8).unwrap();
            buf.write_u64::<BE>(*v).unwrap();
        }
        ArgValue::I64(v) => {
            buf.write_u32::<BE>(8).unwrap();
            buf.write_i64::<BE>(*v).unwrap();
        }
        ArgValue::Bool(v) => {
            buf.write_u32::<BE>(1).unwrap();
            buf.write_u8(if *v { 1 } else { 0 }).unwrap();
        }
        ArgValue::Bytes(bytes) => {
            let len: u32 = bytes.len().try_into().unwrap_or_else(|_| {
                fatal(FramingFault::new("byte argument exceeds u32::MAX"))
            });
            buf.write_u32::<BE>(len).unwrap();
            buf.extend_from_slice(bytes);
        }
        ArgValue::ProxyRef(id) => {
            buf.write_u32::<BE>(8).unwrap();
            buf.write_u64::<BE>(id.as_raw()).unwrap();
        }
        ArgValue::ProxyRefVec(ids) => {
            let len = 4 + 8 * ids.len();
            buf.write_u32::<BE>(len as u32).unwrap();
            buf.write_u32::<BE>(ids.len() as u32).unwrap();
            for id in ids {
                buf.write_u64::<BE>(id.as_raw()).unwrap();
            }
        }
        ArgValue::IdentifiablePointer(ptr) => {
            buf.write_u32::<BE>(9).unwrap();
            buf.write_u8(if ptr.is_null { 1 } else { 0 }).unwrap();
            buf.write_u64::<BE>(ptr.proxy_id.as_raw()).unwrap();
        }
        ArgValue::Status(status) => {
            buf.write_u32::<BE>(1).unwrap();
            buf.write_u8(status.wire_code()).unwrap();
        }
        ArgValue::StatusVec(statuses) => {
            let len = 4 + statuses.len();
            buf.write_u32::<BE>(len as u32).unwrap();
            buf.write_u32::<BE>(statuses.len() as u32).unwrap();
            for status in statuses {
                buf.write_u8(status.wire_code()).unwrap();
            }
        }
    }
}

fn write_header(
    buf: &mut Vec<u8>,
    basic_task: BasicTask,
    detail_task: DetailTask,
    caller_proxy_id: ProxyId,
    args: &[ArgValue],
) {
    buf.write_u32::<BE>(basic_task.wire_code()).unwrap();
    buf.write_u32::<BE>(detail_task.wire_code()).unwrap();
    buf.write_u64::<BE>(caller_proxy_id.as_raw()).unwrap();
    let arg_count: u16 = args.len().try_into().unwrap_or_else(|_| {
        fatal(FramingFault::new("argument tuple exceeds u16::MAX entries"))
    });
    buf.write_u16::<BE>(arg_count).unwrap();
    for arg in args {
        write_entry(buf, arg);
    }
}

/// Serializes a request into `buf` (the transport's scratch send buffer,
/// per C1). `buf` is cleared first.
pub fn serialize_request(buf: &mut Vec<u8>, request: &Request) {
    buf.clear();
    write_header(
        buf,
        request.basic_task,
        DetailTask::SUCCESS,
        request.caller_proxy_id,
        &request.args,
    );
    let new_id_count: u16 = request.new_ids.len().try_into().unwrap_or_else(|_| {
        fatal(FramingFault::new("too many pre-allocated proxy ids in one request"))
    });
    buf.write_u16::<BE>(new_id_count).unwrap();
    for id in &request.new_ids {
        buf.write_u64::<BE>(id.as_raw()).unwrap();
    }
}

/// Serializes a response. Used by test harnesses that script a fake server;
/// a real server is out of scope for this core.
pub fn serialize_response(buf: &mut Vec<u8>, response: &Response) {
    buf.clear();
    write_header(
        buf,
        response.basic_task,
        response.detail_task,
        ProxyId::NONE,
        &response.args,
    );
}

/// Reads one payload field and routes any I/O failure through [`fatal`],
/// the same as every other deserialize failure path in this file: a short
/// read here means the stream has desynchronized, not that the value is
/// merely absent.
fn read_payload_u8(cursor: &mut Cursor<&[u8]>) -> u8 {
    cursor
        .read_u8()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg payload (u8): {e}"))))
}

fn read_payload_u32(cursor: &mut Cursor<&[u8]>) -> u32 {
    cursor
        .read_u32::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg payload (u32): {e}"))))
}

fn read_payload_u64(cursor: &mut Cursor<&[u8]>) -> u64 {
    cursor
        .read_u64::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg payload (u64): {e}"))))
}

fn read_payload_i64(cursor: &mut Cursor<&[u8]>) -> i64 {
    cursor
        .read_i64::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg payload (i64): {e}"))))
}

/// Bounds a count field read from the payload against the entry's own
/// declared `len` before it is used to size an allocation: `len` was
/// already checked against the bytes actually remaining in the buffer, so
/// this rejects a count that does not fit in `len` before `Vec::with_capacity`
/// ever sees the attacker-controlled value directly.
fn check_count_fits(count: usize, element_size: usize, fixed_overhead: usize, len: usize, what: &str) {
    let max_count = len.saturating_sub(fixed_overhead) / element_size.max(1);
    if count > max_count {
        fatal(FramingFault::new(format!(
            "{what} count {count} cannot fit in a {len}-byte entry"
        )));
    }
}

fn read_entry(cursor: &mut Cursor<&[u8]>) -> ArgValue {
    let type_tag = cursor
        .read_u16::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg type tag: {e}"))));
    let len = cursor
        .read_u32::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg length: {e}"))))
        as usize;
    let start = cursor.position() as usize;
    let remaining = cursor.get_ref().len().saturating_sub(start);
    if len > remaining {
        fatal(FramingFault::new(format!(
            "arg entry claims {len} bytes but only {remaining} remain"
        )));
    }
    let value = match type_tag {
        0 => ArgValue::Unit,
        1 => ArgValue::U8(read_payload_u8(cursor)),
        2 => ArgValue::U32(read_payload_u32(cursor)),
        3 => ArgValue::U64(read_payload_u64(cursor)),
        4 => ArgValue::I64(read_payload_i64(cursor)),
        5 => ArgValue::Bool(read_payload_u8(cursor) != 0),
        6 => {
            let mut bytes = vec![0u8; len];
            std::io::Read::read_exact(cursor, &mut bytes)
                .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated bytes payload: {e}"))));
            return ArgValue::Bytes(bytes);
        }
        7 => ArgValue::ProxyRef(ProxyId::from_raw(read_payload_u64(cursor))),
        8 => {
            let count = read_payload_u32(cursor) as usize;
            check_count_fits(count, 8, 4, len, "proxy ref vec");
            let mut ids = Vec::with_capacity(count);
            for _ in 0..count {
                ids.push(ProxyId::from_raw(read_payload_u64(cursor)));
            }
            ArgValue::ProxyRefVec(ids)
        }
        9 => {
            let is_null = read_payload_u8(cursor) != 0;
            let proxy_id = ProxyId::from_raw(read_payload_u64(cursor));
            ArgValue::IdentifiablePointer(IdentifiablePointer { is_null, proxy_id })
        }
        10 => {
            let code = read_payload_u8(cursor);
            let status = Status::from_wire_code(code)
                .unwrap_or_else(|| fatal(FramingFault::new(format!("unknown status code {code}"))));
            ArgValue::Status(status)
        }
        11 => {
            let count = read_payload_u32(cursor) as usize;
            check_count_fits(count, 1, 4, len, "status vec");
            let mut statuses = Vec::with_capacity(count);
            for _ in 0..count {
                let code = read_payload_u8(cursor);
                statuses.push(Status::from_wire_code(code).unwrap_or_else(|| {
                    fatal(FramingFault::new(format!("unknown status code {code}")))
                }));
            }
            ArgValue::StatusVec(statuses)
        }
        other => fatal(FramingFault::new(format!("unknown arg type tag {other}"))),
    };
    // `len` is the declared entry length; verify the reader actually
    // consumed exactly that much so a short/long read is caught here
    // rather than desynchronizing the next entry.
    let consumed = cursor.position() as usize - start;
    if consumed != len {
        fatal(FramingFault::new(format!(
            "arg entry declared {len} bytes but {consumed} were consumed"
        )));
    }
    value
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> (BasicTask, DetailTask, ProxyId, Vec<ArgValue>) {
    let basic_code = cursor
        .read_u32::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated basic task: {e}"))));
    let basic_task = BasicTask::from_wire_code(basic_code)
        .unwrap_or_else(|| fatal(FramingFault::new(format!("unknown basic task {basic_code}"))));
    let detail_code = cursor
        .read_u32::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated detail task: {e}"))));
    let caller = cursor
        .read_u64::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated caller proxy id: {e}"))));
    let arg_count = cursor
        .read_u16::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated arg count: {e}"))));
    let mut args = Vec::with_capacity(arg_count as usize);
    for _ in 0..arg_count {
        args.push(read_entry(cursor));
    }
    (
        basic_task,
        DetailTask::from_wire_code(detail_code),
        ProxyId::from_raw(caller),
        args,
    )
}

/// Decodes a response from raw wire bytes. Any malformed input is a framing
/// fault and aborts the process: the only way a well-behaved server
/// produces bytes this codec cannot parse is a protocol-version mismatch.
pub fn deserialize_response(bytes: &[u8]) -> Response {
    let mut cursor = Cursor::new(bytes);
    let (basic_task, detail_task, _caller, args) = read_header(&mut cursor);
    Response {
        basic_task,
        detail_task,
        args,
    }
}

/// Decodes a request from raw wire bytes. Used by test harnesses standing
/// in for the server side of the wire.
pub fn deserialize_request(bytes: &[u8]) -> Request {
    let mut cursor = Cursor::new(bytes);
    let (basic_task, _detail, caller, args) = read_header(&mut cursor);
    let new_id_count = cursor
        .read_u16::<BE>()
        .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated new id count: {e}"))));
    let mut new_ids = Vec::with_capacity(new_id_count as usize);
    for _ in 0..new_id_count {
        let raw = cursor
            .read_u64::<BE>()
            .unwrap_or_else(|e| fatal(FramingFault::new(format!("truncated new id: {e}"))));
        new_ids.push(ProxyId::from_raw(raw));
    }
    Request {
        basic_task,
        caller_proxy_id: caller,
        args,
        new_ids,
    }
}

fn entry_size(arg: &ArgValue) -> usize {
    let payload = match arg {
        ArgValue::Unit => 0,
        ArgValue::U8(_) | ArgValue::Bool(_) => 1,
        ArgValue::U32(_) => 4,
        ArgValue::U64(_) | ArgValue::I64(_) => 8,
        ArgValue::Bytes(b) => b.len(),
        ArgValue::ProxyRef(_) => 8,
        ArgValue::ProxyRefVec(ids) => 4 + 8 * ids.len(),
        ArgValue::IdentifiablePointer(_) => 1 + 8,
        ArgValue::Status(_) => 1,
        ArgValue::StatusVec(s) => 4 + s.len(),
    };
    ENTRY_OVERHEAD + payload
}

/// Predicts `(total_size, per_msg_overhead)` for a request built from
/// `basic_task`/`caller`/`args`, used by [`crate::chunking`] to decide how
/// large a region slice it may send in one wire call. `per_msg_overhead` is
/// everything in the message *except* the bytes of the single `Bytes`
/// argument that chunking is allowed to split (there must be at most one;
/// having more would make "which one do I shrink" ambiguous).
pub fn predict_size(basic_task: BasicTask, caller: ProxyId, args: &[ArgValue]) -> (usize, usize) {
    let _ = (basic_task, caller); // task/caller contribute a fixed, task-independent amount to HEADER_SIZE
    let mut total = HEADER_SIZE;
    let mut region_len = 0usize;
    for arg in args {
        total += entry_size(arg);
        if let Some(bytes) = arg.as_bytes() {
            region_len += bytes.len();
        }
    }
    (total, total - region_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let req = Request::new(
            BasicTask::HashUpdate,
            ProxyId::from_raw(7),
            vec![ArgValue::Bytes(b"abc".to_vec())],
        );
        let mut buf = Vec::new();
        serialize_request(&mut buf, &req);
        let decoded = deserialize_request(&buf);
        assert_eq!(decoded, req);
    }

    #[test]
    fn factory_request_carries_new_ids() {
        let req = Request::new(BasicTask::HashCreate, ProxyId::NONE, vec![ArgValue::U32(1)])
            .with_new_ids(vec![ProxyId::from_raw(42)]);
        let mut buf = Vec::new();
        serialize_request(&mut buf, &req);
        let decoded = deserialize_request(&buf);
        assert_eq!(decoded.new_ids, vec![ProxyId::from_raw(42)]);
    }

    #[test]
    fn response_round_trips_with_out_params() {
        let resp = Response {
            basic_task: BasicTask::CertificateVerifyChain,
            detail_task: DetailTask::SUCCESS,
            args: vec![
                ArgValue::Status(Status::NoTrust),
                ArgValue::StatusVec(vec![Status::NoTrust, Status::NoTrust, Status::NoTrust]),
            ],
        };
        let mut buf = Vec::new();
        serialize_response(&mut buf, &resp);
        let decoded = deserialize_response(&buf);
        assert_eq!(decoded, resp);
    }

    #[test]
    fn predict_size_overhead_excludes_only_the_region() {
        let args_empty = vec![ArgValue::ProxyRef(ProxyId::from_raw(1)), ArgValue::Bytes(vec![])];
        let (_total_empty, overhead) =
            predict_size(BasicTask::HashUpdate, ProxyId::from_raw(9), &args_empty);

        let args_full = vec![
            ArgValue::ProxyRef(ProxyId::from_raw(1)),
            ArgValue::Bytes(vec![0u8; 1000]),
        ];
        let (total_full, overhead_full) =
            predict_size(BasicTask::HashUpdate, ProxyId::from_raw(9), &args_full);

        assert_eq!(overhead, overhead_full);
        assert_eq!(total_full, overhead + 1000);
    }
}
