use std::ffi::{c_char, c_int, CStr};

use curl_sys::curl_free;
use httpwrap_interface::{Error as BackendError, Result as BackendResult};
use memchr::memmem;

fn escape_failed() -> BackendError {
    BackendError::Transfer {
        code: curl_sys::CURLE_OUT_OF_MEMORY as i32,
        message: "curl error:curl_easy_escape:failed to escape string".into(),
    }
}

/// Percent-encodes `str` the way HTML forms do (space becomes `+`) and appends it to `buf`.
pub(crate) fn form_url_encode(
    raw_easy: *mut curl_sys::CURL,
    str: impl AsRef<[u8]>,
    buf: &mut Vec<u8>,
) -> BackendResult<()> {
    struct CurlString(*mut c_char);
    impl Drop for CurlString {
        fn drop(&mut self) {
            unsafe {
                curl_free(self.0 as _);
            }
        }
    }
    let str = str.as_ref();
    if str.is_empty() {
        return Ok(());
    }
    let len: c_int = str.len().try_into().map_err(|_| escape_failed())?;
    let start = buf.len();
    unsafe {
        let raw_str = curl_sys::curl_easy_escape(raw_easy, str.as_ptr() as _, len);
        if raw_str.is_null() {
            return Err(escape_failed());
        }
        let raw_str = CurlString(raw_str);
        buf.extend_from_slice(CStr::from_ptr(raw_str.0).to_bytes());
    }
    {
        // replace %20 with +
        let mut idx = start;
        while let Some(pos) = memmem::find(&buf[idx..], b"%20") {
            buf.splice(idx + pos..idx + pos + 3, *b"+");
            idx += pos + 1;
        }
    }
    Ok(())
}

/// Encodes `pairs` as `k1=v1&k2=v2`.
pub(crate) fn encode_pairs(
    raw_easy: *mut curl_sys::CURL,
    pairs: &[(String, String)],
) -> BackendResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());
    for (idx, (name, value)) in pairs.iter().enumerate() {
        if idx > 0 {
            buf.push(b'&');
        }
        form_url_encode(raw_easy, name, &mut buf)?;
        buf.push(b'=');
        form_url_encode(raw_easy, value, &mut buf)?;
    }
    Ok(buf)
}

/// Appends the encoded query to `url`, keeping any query the URL already has.
pub(crate) fn append_query(
    raw_easy: *mut curl_sys::CURL,
    url: &str,
    query: &[(String, String)],
) -> BackendResult<String> {
    if query.is_empty() {
        return Ok(url.into());
    }
    let encoded = encode_pairs(raw_easy, query)?;
    // Escaped output is plain ASCII.
    let encoded = String::from_utf8_lossy(&encoded);
    let (url, fragment) = url.split_once('#').map_or((url, None), |(u, f)| (u, Some(f)));
    let sep = match url.find('?') {
        None => "?",
        Some(pos) if pos + 1 == url.len() || url.ends_with('&') => "",
        Some(_) => "&",
    };
    let mut full = format!("{url}{sep}{encoded}");
    if let Some(fragment) = fragment {
        full.push('#');
        full.push_str(fragment);
    }
    Ok(full)
}
