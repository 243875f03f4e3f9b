//! 掩码模板填充
//!
//! 分句服务为每段原文返回一个掩码，原文中每个分句的位置被替换成占位符，
//! 句间空白等非分句内容原样保留。占位符语法：
//!
//! - `{}` 按顺序取下一条译文
//! - `{n}` 取第 n 条译文（从 0 开始）
//! - `{{` 与 `}}` 分别输出字面量 `{` 与 `}`
//!
//! 同一掩码中不能混用自动编号与显式编号。多余的译文会被忽略。

use crate::error::{GatewayError, GatewayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Unknown,
    Automatic,
    Manual,
}

/// 用译文依次替换掩码中的占位符
pub fn fill<S: AsRef<str>>(mask: &str, translations: &[S]) -> GatewayResult<String> {
    let capacity = mask.len() + translations.iter().map(|t| t.as_ref().len()).sum::<usize>();
    let mut output = String::with_capacity(capacity);
    let mut chars = mask.char_indices().peekable();
    let mut next_auto = 0usize;
    let mut numbering = Numbering::Unknown;

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    output.push('{');
                    continue;
                }

                let mut field = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    field.push(inner);
                }
                if !closed {
                    return Err(GatewayError::Mask(format!(
                        "位置 {} 的占位符未闭合: {:?}",
                        position, mask
                    )));
                }

                let index = if field.is_empty() {
                    if numbering == Numbering::Manual {
                        return Err(mixed_numbering(mask));
                    }
                    numbering = Numbering::Automatic;
                    next_auto += 1;
                    next_auto - 1
                } else {
                    if numbering == Numbering::Automatic {
                        return Err(mixed_numbering(mask));
                    }
                    numbering = Numbering::Manual;
                    field.parse::<usize>().map_err(|_| {
                        GatewayError::Mask(format!("无效的占位符 {{{}}}: {:?}", field, mask))
                    })?
                };

                let translation = translations.get(index).ok_or_else(|| {
                    GatewayError::Mask(format!(
                        "占位符索引 {} 超出译文数量 {}: {:?}",
                        index,
                        translations.len(),
                        mask
                    ))
                })?;
                output.push_str(translation.as_ref());
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    output.push('}');
                } else {
                    return Err(GatewayError::Mask(format!(
                        "位置 {} 存在未配对的 '}}': {:?}",
                        position, mask
                    )));
                }
            }
            _ => output.push(c),
        }
    }

    Ok(output)
}

fn mixed_numbering(mask: &str) -> GatewayError {
    GatewayError::Mask(format!("掩码不能混用自动编号与显式编号: {:?}", mask))
}
