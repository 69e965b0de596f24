fn main() {
    // Embed Windows version resources
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();
        res.set("ProductName", "GammaKeeper");
        res.set("FileDescription", "Per-monitor gamma control for Windows");
        res.set("CompanyName", "GammaKeeper Contributors");
        res.set("OriginalFilename", "gammakeeper.exe");
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        if let Err(e) = res.compile() {
            println!("cargo:warning=Failed to embed Windows resources: {e}");
        }
    }
}
