use httpwrap::Options;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    httpwrap_backend_curl::register();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://0.0.0.0:1234".into());

    // Callback only
    let get_opts = Options::new(format!("{base}/get"));
    let first = httpwrap::get_with(get_opts.clone(), |outcome| {
        if let Ok(response) = outcome {
            println!("{}", response.body());
        }
    });

    // Blocking wait on the handle
    match httpwrap::get(get_opts).wait() {
        Ok(response) => println!("{}", response.body()),
        Err(e) => eprintln!("GET failed: {e}"),
    }

    let post_opts = Options::new(format!("{base}/post"))
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_form_field("message", "hello");
    let second = httpwrap::post_with(post_opts, |outcome| match outcome {
        Ok(response) => println!("{}", response.body()),
        Err(e) => eprintln!("POST failed: {e}"),
    });

    first.wait().ok();
    second.wait().ok();
}
