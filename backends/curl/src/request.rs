use curl::easy::{Easy2, Form, Handler, List};
use httpwrap_interface::{FormEncoding, Method, Request, Result as BackendResult};

use crate::error::IntoBackendResult;
use crate::url::{append_query, encode_pairs};

pub(crate) fn populate_request<H: Handler>(
    easy: &mut Easy2<H>,
    req: &Request,
) -> BackendResult<()> {
    let raw = easy.raw();
    let encoding = match req.method {
        Method::Get => None,
        Method::Post => Some(req.form_encoding()?),
    };
    let url = match req.method {
        Method::Get => append_query(raw, &req.url, &req.query)?,
        Method::Post => req.url.clone(),
    };
    easy.url(&url).into_backend_result("set url")?;

    let multipart = encoding == Some(FormEncoding::Multipart);
    let mut headers = List::new();
    for (name, value) in &req.headers {
        // libcurl generates the multipart content-type itself, boundary included
        if multipart && name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        headers
            .append(&format!("{name}: {value}"))
            .into_backend_result("append header")?;
    }
    if multipart && req.form.is_empty() {
        // No parts means no boundary. Send a bare empty body and suppress libcurl's default
        // urlencoded content-type.
        headers
            .append("Content-Type:")
            .into_backend_result("append header")?;
    }
    easy.http_headers(headers)
        .into_backend_result("set headers")?;

    match encoding {
        None => easy.get(true).into_backend_result("set get")?,
        Some(FormEncoding::Multipart) if !req.form.is_empty() => {
            let mut form = Form::new();
            for (name, value) in &req.form {
                form.part(name)
                    .contents(value.as_bytes())
                    .add()
                    .into_backend_result("add form part")?;
            }
            easy.httppost(form).into_backend_result("set multipart form")?;
        }
        Some(_) => {
            let body = encode_pairs(raw, &req.form)?;
            easy.post(true).into_backend_result("set post")?;
            // An explicit empty body also works around https://github.com/curl/curl/issues/1625
            easy.post_fields_copy(&body)
                .into_backend_result("set post fields")?;
        }
    }
    Ok(())
}
