//! `git2kube version` — prints the crate version baked in at compile time.

pub fn run() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}
