use anyhow::Result;
use clap::{Parser, Subcommand};
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "qrget 开发任务自动化")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建 qrget (release)
    Build,
    /// 以详细日志运行 qrget (开发模式)
    Run {
        /// 传给 qrget 的参数
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// 安装到 /usr/local/bin
    Install,
    /// 打包发布 (tar.gz)
    Dist,
    /// 运行测试
    Test,
    /// 运行测试并生成覆盖率报告
    Coverage,
    /// 清理构建产物
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    // 确保在项目根目录执行
    let project_root = std::env::var("CARGO_MANIFEST_DIR")
        .map(std::path::PathBuf::from)
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));
    if let Some(root) = project_root {
        sh.change_dir(root);
    }

    match cli.command {
        Commands::Build => build(&sh)?,
        Commands::Run { args } => run(&sh, &args)?,
        Commands::Install => install(&sh)?,
        Commands::Dist => dist(&sh)?,
        Commands::Test => test(&sh)?,
        Commands::Coverage => coverage(&sh)?,
        Commands::Clean => clean(&sh)?,
    }

    Ok(())
}

fn build(sh: &Shell) -> Result<()> {
    println!("🔨 构建 qrget...");
    cmd!(sh, "cargo build --release -p qrget-cli").run()?;
    println!("✅ 构建完成: target/release/qrget");
    Ok(())
}

fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 启动 qrget (RUST_LOG=debug)...");
    let _env = sh.push_env("RUST_LOG", "info,qrget=debug,qrget_core=debug,qrget_preview=debug");
    cmd!(sh, "cargo run -p qrget-cli -- {args...}").run()?;
    Ok(())
}

fn install(sh: &Shell) -> Result<()> {
    println!("📦 安装 qrget...");
    build(sh)?;
    cmd!(sh, "sudo cp target/release/qrget /usr/local/bin/").run()?;
    println!("✅ 安装完成，使用 'qrget --help' 查看用法");
    Ok(())
}

fn dist(sh: &Shell) -> Result<()> {
    println!("📦 打包发布...");

    build(sh)?;

    let version = env!("CARGO_PKG_VERSION");
    let dist_name = format!("qrget-{}-linux-x86_64", version);

    cmd!(sh, "mkdir -p dist/{dist_name}").run()?;
    cmd!(sh, "cp target/release/qrget dist/{dist_name}/").run()?;

    sh.change_dir("dist");
    cmd!(sh, "tar -czvf {dist_name}.tar.gz {dist_name}").run()?;

    println!("✅ 打包完成: dist/{}.tar.gz", dist_name);
    Ok(())
}

fn test(sh: &Shell) -> Result<()> {
    println!("🧪 运行测试...");
    cmd!(sh, "cargo test --workspace").run()?;
    println!("✅ 测试完成");
    Ok(())
}

fn coverage(sh: &Shell) -> Result<()> {
    println!("📊 运行测试覆盖率分析...");

    // 检查 cargo-tarpaulin 是否安装
    if cmd!(sh, "cargo tarpaulin --version").run().is_err() {
        println!("📦 安装 cargo-tarpaulin...");
        cmd!(sh, "cargo install cargo-tarpaulin").run()?;
    }

    cmd!(
        sh,
        "cargo tarpaulin --packages qrget-core --out Html --output-dir target/coverage"
    )
    .run()?;

    println!("✅ 覆盖率报告已生成");
    println!("   HTML 报告: target/coverage/tarpaulin-report.html");
    Ok(())
}

fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 清理构建产物...");
    cmd!(sh, "cargo clean").run()?;
    cmd!(sh, "rm -rf dist").run()?;
    println!("✅ 清理完成");
    Ok(())
}
