// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_html(sections: usize) -> String {
    let base = "<h2>Section</h2><p>Paragraph with <b>bold <i>nested</i></b> and <a href=\"http://x.com\">a link</a>.</p><ul><li>one</li><li><em>two</em></li></ul>";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_mobiledoc(sections: usize) -> String {
    let section = r#"[1,"p",[[[],0,"plain "],[[0],0,"bold "],[[1],2,"both"],[[2],1," link"]]]"#;
    let body = vec![section; sections].join(",");
    format!(
        r#"{{"version":"0.1","sections":[[["strong",[]],["em",[]],["a",["href","http://x.com"]]],[{body}]]}}"#
    )
}
