use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use config_search::config::SearchSettings;
use config_search::interpreter::Interpreter;
use config_search::lexer;
use config_search::parser::Parser;
use config_search::sql_compiler;

/// 加载搜索配置，优先使用JSON配置文件，失败时使用默认配置
fn load_settings() -> SearchSettings {
    match SearchSettings::from_json_file("search_settings.json") {
        Ok(settings) => {
            println!("✅ 成功从JSON配置文件加载搜索配置");
            settings
        }
        Err(e) => {
            println!("⚠️ 无法加载JSON配置文件 ({}), 使用默认配置", e);
            SearchSettings::default()
        }
    }
}

fn main() -> Result<()> {
    println!("--- 配置记录搜索: 查询到 SQL 编译器 ---");
    let settings = load_settings();

    // 示例查询
    let demo = "(h1 or h2) and submitted by admin";
    println!("\n[示例查询]:");
    run_query(demo, &settings);

    // 交互式查询
    println!("\n输入搜索表达式 (exit 退出):");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("search> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                let _ = editor.add_history_entry(line);
                run_query(line, &settings);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// 运行完整管线并打印每个阶段的结果
fn run_query(text: &str, settings: &SearchSettings) {
    println!("\n[输入查询]:\n{}", text);

    if text.len() > settings.max_query_bytes {
        println!("✗ 查询过长 ({} 字节, 上限 {})", text.len(), settings.max_query_bytes);
        return;
    }

    // 1. 词法分析器 - 对查询进行分词
    println!("\n[步骤 1]: 对查询进行分词...");
    let tokens = lexer::scan(text);
    println!("生成了 {} 个 token", tokens.len());

    // 2. 语法分析器 - 从 token 构建 AST
    println!("\n[步骤 2]: 将 token 解析为 AST...");
    let mut parser = Parser::with_depth_limit(&tokens, settings.max_group_depth);
    let expr = match parser.parse() {
        Ok(expr) => {
            println!("✓ AST: {}", expr.print());
            expr
        }
        Err(e) => {
            println!("✗ 解析失败: {}", e.message);
            if let Some(span) = e.span {
                println!("  位置 {}-{}", span.start, span.end);
            }
            return;
        }
    };

    // 3. 解释器 - 将 AST 降级为过滤谓词
    println!("\n[步骤 3]: 将 AST 解释为过滤谓词...");
    let interpreter = Interpreter::new(settings.default_offset());
    let predicate = match interpreter.evaluate(&expr) {
        Ok(predicate) => {
            println!("✓ 谓词: {:?}", predicate);
            predicate
        }
        Err(e) => {
            println!("✗ 解释失败: {}", e);
            return;
        }
    };

    // 4. SQL 编译器 - 演示持久层的降级
    println!("\n[步骤 4]: 将谓词编译为 SQL...");
    println!("{}", sql_compiler::render_sql(&predicate));
}
