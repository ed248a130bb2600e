use std::collections::HashSet;

use tracing::warn;

use matti_types::CategorySeed;

/// Parse a bulk upload: one `name,points` pair per line.
///
/// Blank lines are skipped. The name is everything before the first comma,
/// trimmed; the rest must be an integer. Malformed lines and exact repeats
/// of an earlier name are dropped with a warning; the first occurrence wins.
pub fn parse_category_lines(content: &str) -> Vec<CategorySeed> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((name, points)) = line.split_once(',') else {
            warn!("Malformed upload line skipped: {}", line);
            continue;
        };
        let name = name.trim();
        let Ok(points) = points.trim().parse::<i64>() else {
            warn!("Malformed upload line skipped: {}", line);
            continue;
        };
        if name.is_empty() {
            warn!("Upload line without a name skipped: {}", line);
            continue;
        }
        if !seen.insert(name.to_string()) {
            warn!("Duplicate name in upload skipped: {}", name);
            continue;
        }
        parsed.push(CategorySeed::new(name, points));
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_lines() {
        let seeds = parse_category_lines("Gufo,5\n  Spada , -10  \r\nTroll,+3\n");
        assert_eq!(
            seeds,
            vec![
                CategorySeed::new("Gufo", 5),
                CategorySeed::new("Spada", -10),
                CategorySeed::new("Troll", 3),
            ]
        );
    }

    #[test]
    fn skips_malformed_and_blank_lines() {
        let seeds = parse_category_lines("\n\nno comma here\nGufo,cinque\n,4\nVolpe,2\nOrso,1,2\n   \n");
        assert_eq!(seeds, vec![CategorySeed::new("Volpe", 2)]);
    }

    #[test]
    fn first_duplicate_wins() {
        let seeds = parse_category_lines("Gufo,5\nGufo,9\ngufo,1");
        assert_eq!(seeds, vec![CategorySeed::new("Gufo", 5), CategorySeed::new("gufo", 1)]);
    }

    #[test]
    fn name_keeps_inner_spaces() {
        let seeds = parse_category_lines("Uomo col cappello, 4");
        assert_eq!(seeds, vec![CategorySeed::new("Uomo col cappello", 4)]);
    }
}
