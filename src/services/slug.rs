/// Public slug for a document: the title folded to lowercase ASCII with runs
/// of anything else collapsed to `-`, suffixed with the id so it is unique.
pub fn slugify(title: &str, id: i64) -> String {
    let mut base = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        match fold(c) {
            Some(ascii) => {
                if pending_dash && !base.is_empty() {
                    base.push('-');
                }
                pending_dash = false;
                base.push(ascii);
            }
            None => pending_dash = true,
        }
    }

    if base.is_empty() {
        base.push_str("planeacion");
    }
    format!("{base}-{id}")
}

fn fold(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        c if c.is_ascii_alphanumeric() => c,
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_separators() {
        assert_eq!(slugify("Planeación de Cálculo Diferencial", 12), "planeacion-de-calculo-diferencial-12");
        assert_eq!(slugify("  Álgebra -- Lineal (2024)!  ", 3), "algebra-lineal-2024-3");
        assert_eq!(slugify("Niño & Pingüino", 9), "nino-pinguino-9");
    }

    #[test]
    fn empty_titles_still_get_a_slug() {
        assert_eq!(slugify("", 5), "planeacion-5");
        assert_eq!(slugify("¿¡!?", 6), "planeacion-6");
    }
}
