//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test，并检查默认布局清单
//! - `cov-core`: 运行 tile-grid 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `layout-check`: 检查布局清单（解析、尺寸、速度、共用键）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use tile_grid::{GridLayout, LayoutIssue};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

/// 以 `cargo <args>` 为步骤名执行一次 cargo
fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    run(&format!("cargo {}", args.join(" ")), &mut cmd)
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            cargo(&["fmt", "--all", "--", "--check"])?;
            cargo(&["clippy", "--workspace", "--all-targets"])?;
            cargo(&["test", "--workspace"])?;

            eprintln!("\n==> layout-check");
            layout_check(None)?;
        }
        "cov-core" => {
            ensure_cargo_llvm_cov_available()?;
            cargo(&["llvm-cov", "-p", "tile-grid", "--all-features", "--html"])?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;
            // 排除 xtask，只统计引擎与宿主
            cargo(&[
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--all-features",
                "--html",
            ])?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "layout-check" => {
            let path = args.next();
            layout_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 与 layout-check 门禁检查
  cov-core        运行 tile-grid 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  layout-check    检查布局清单

LAYOUT-CHECK:
  cargo xtask layout-check [path]

  不带参数：检查 assets/ 下所有 layout*.json 文件
  带路径参数：检查指定文件或目录下的所有 .json 文件

  检查内容：
    - JSON 结构与格子种类
    - 尺寸与速度（错误）
    - 空列、无效图标码位（错误）
    - 多个格子共用一个键、空 states（警告）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-core      -> cargo xtask cov-core
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo layout-check  -> cargo xtask layout-check
"#
    );
}

//=============================================================================
// layout-check 命令实现
//=============================================================================

/// 默认布局目录（相对于 workspace root）
const DEFAULT_LAYOUT_DIR: &str = "assets";

/// 检查结果
#[derive(Default)]
struct LayoutCheckResult {
    /// 检查的文件数量
    files_checked: usize,
    /// 无法读取或解析的文件数量
    parse_errors: usize,
    /// (文件, 问题)
    issues: Vec<(String, LayoutIssue)>,
}

impl LayoutCheckResult {
    fn error_count(&self) -> usize {
        self.parse_errors + self.issues.iter().filter(|(_, i)| i.is_error()).count()
    }

    fn warn_count(&self) -> usize {
        self.issues.iter().filter(|(_, i)| !i.is_error()).count()
    }
}

/// 执行布局检查
fn layout_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_layout_files(&path, |_| true)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(DEFAULT_LAYOUT_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认布局目录不存在: {}\n请在 workspace 根目录运行，或指定布局路径",
                    dir.display()
                );
            }
            collect_layout_files(dir, |name| name.starts_with("layout"))
        }
    };

    if files.is_empty() {
        eprintln!("未找到布局文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个布局文件...\n", files.len());

    let mut result = LayoutCheckResult::default();
    for file in &files {
        check_layout_file(file, &mut result);
    }

    print_check_result(&result);

    if result.error_count() > 0 {
        anyhow::bail!("布局检查发现错误");
    }
    Ok(())
}

/// 收集目录下的布局文件
fn collect_layout_files(dir: &Path, accept: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(&accept)
        })
        .collect();
    files.sort();
    files
}

/// 检查单个布局文件
fn check_layout_file(file: &Path, result: &mut LayoutCheckResult) {
    let id = file.display().to_string();
    result.files_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", id, e);
            result.parse_errors += 1;
            return;
        }
    };

    let layout = match GridLayout::from_json(&content) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("[ERROR] {}: {}", id, e);
            result.parse_errors += 1;
            return;
        }
    };

    eprintln!(
        "{}: {} 列, {} 个格子",
        id,
        layout.columns.len(),
        layout.cell_count()
    );
    for issue in layout.validate() {
        result.issues.push((id.clone(), issue));
    }
}

/// 输出检查结果
fn print_check_result(result: &LayoutCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个布局", result.files_checked);
    eprintln!();

    for (file, issue) in &result.issues {
        eprintln!("{}: {}", file, issue);
    }

    let error_count = result.error_count();
    let warn_count = result.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LAYOUT: &str = r#"{ "columns": [ { "cells": [
        { "kind": "binary", "entity": "door" },
        { "kind": "binary", "entity": "door" }
    ] } ] }"#;

    #[test]
    fn test_collect_layout_files_filters_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("layout.json"), LAYOUT).unwrap();
        fs::write(dir.path().join("nested/layout_small.json"), LAYOUT).unwrap();
        fs::write(dir.path().join("events.json"), "{}").unwrap();
        fs::write(dir.path().join("layout.txt"), "").unwrap();

        let files = collect_layout_files(dir.path(), |name| name.starts_with("layout"));
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["layout.json", "layout_small.json"]);

        assert_eq!(collect_layout_files(dir.path(), |_| true).len(), 3);
    }

    #[test]
    fn test_check_layout_file_counts_issues() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("layout.json");
        let broken = dir.path().join("layout_broken.json");
        fs::write(&good, LAYOUT).unwrap();
        fs::write(&broken, "{ not json").unwrap();

        let mut result = LayoutCheckResult::default();
        check_layout_file(&good, &mut result);
        assert_eq!(result.files_checked, 1);
        assert_eq!(result.error_count(), 0);
        // 两个格子共用 door
        assert_eq!(result.warn_count(), 1);

        check_layout_file(&broken, &mut result);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.parse_errors, 1);
        assert_eq!(result.error_count(), 1);
    }
}
