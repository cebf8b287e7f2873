//! Quill playground CLI.

#[tokio::main]
async fn main() {
    quillc::init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let code = quillc::commands::dispatch(&args).await;
    std::process::exit(code);
}
