//! Bounding boxes for SVG path data.
//!
//! Only the straight-line commands a bar chart emits are understood
//! (M, L, H, V, Z and their relative forms). Curve commands contribute their
//! end point, which is enough for the width heuristic.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(d: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut num = String::new();
    let flush = |num: &mut String, tokens: &mut Vec<Token>| {
        if !num.is_empty() {
            if let Ok(v) = num.parse::<f64>() {
                tokens.push(Token::Number(v));
            }
            num.clear();
        }
    };
    for ch in d.chars() {
        match ch {
            c if c.is_ascii_alphabetic() && c != 'e' && c != 'E' => {
                flush(&mut num, &mut tokens);
                tokens.push(Token::Command(c));
            }
            '-' if !num.is_empty() && !num.ends_with(['e', 'E']) => {
                flush(&mut num, &mut tokens);
                num.push('-');
            }
            '.' if num.contains('.') && !num.contains(['e', 'E']) => {
                flush(&mut num, &mut tokens);
                num.push('.');
            }
            c if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') => num.push(c),
            _ => flush(&mut num, &mut tokens),
        }
    }
    flush(&mut num, &mut tokens);
    tokens
}

/// Number of coordinates consumed per repetition of a command.
fn arity(cmd: char) -> usize {
    match cmd.to_ascii_uppercase() {
        'H' | 'V' => 1,
        'M' | 'L' | 'T' => 2,
        'S' | 'Q' => 4,
        'C' => 6,
        'A' => 7,
        _ => 0,
    }
}

/// Compute the bounding box of a path's vertices, or `None` for empty data.
pub fn path_bbox(d: &str) -> Option<BBox> {
    let tokens = tokenize(d);
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let (mut start_x, mut start_y) = (0.0_f64, 0.0_f64);
    let mut bbox: Option<BBox> = None;
    let visit = |x: f64, y: f64, bbox: &mut Option<BBox>| match bbox {
        Some(b) => b.include(x, y),
        None => *bbox = Some(BBox { min_x: x, min_y: y, max_x: x, max_y: y }),
    };

    let mut i = 0;
    while i < tokens.len() {
        let Token::Command(mut cmd) = tokens[i] else {
            i += 1;
            continue;
        };
        i += 1;
        if cmd.eq_ignore_ascii_case(&'z') {
            x = start_x;
            y = start_y;
            continue;
        }
        let n = arity(cmd);
        if n == 0 {
            continue;
        }
        let mut first = true;
        loop {
            let args: Vec<f64> = tokens[i..]
                .iter()
                .take(n)
                .map_while(|t| match t {
                    Token::Number(v) => Some(*v),
                    Token::Command(_) => None,
                })
                .collect();
            if args.len() < n {
                break;
            }
            i += n;
            let rel = cmd.is_ascii_lowercase();
            match cmd.to_ascii_uppercase() {
                'H' => x = if rel { x + args[0] } else { args[0] },
                'V' => y = if rel { y + args[0] } else { args[0] },
                _ => {
                    let (ex, ey) = (args[n - 2], args[n - 1]);
                    if rel {
                        x += ex;
                        y += ey;
                    } else {
                        x = ex;
                        y = ey;
                    }
                }
            }
            if first && cmd.eq_ignore_ascii_case(&'m') {
                start_x = x;
                start_y = y;
                // Extra pairs after a moveto are implicit linetos.
                cmd = if rel { 'l' } else { 'L' };
            }
            first = false;
            visit(x, y, &mut bbox);
        }
    }
    bbox
}
