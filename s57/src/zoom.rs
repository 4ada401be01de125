//! Calcul des niveaux de zoom à partir des dénominateurs d'échelle
//!
//! Le zoom 28 correspond à l'échelle 1:1. Chaque division par deux de
//! l'échelle fait gagner un niveau de détail, d'où
//! `zoom = 28 - ceil(log2(scale))` pour `scale > 1`.

/// Niveau de zoom de l'échelle 1:1 (détail maximal)
pub const ONE_TO_ONE_ZOOM: i32 = 28;

/// Zoom minimal par défaut (SCAMIN absent)
pub const DEFAULT_MIN_ZOOM: i32 = 0;

/// Trouve le niveau de zoom d'une échelle.
///
/// Aucun bornage n'est appliqué : le résultat peut être négatif pour des
/// échelles supérieures à 2^28.
pub fn find_zoom(scale: i32) -> i32 {
    let mut zoom = ONE_TO_ONE_ZOOM;
    let mut z_scale = f64::from(scale);
    while z_scale > 1.0 {
        z_scale /= 2.0;
        zoom -= 1;
    }
    zoom
}

/// Calcule `(min_z, max_z)` à partir de SCAMIN et SCAMAX.
///
/// Une valeur nulle ou négative signifie "absente". Le résultat respecte
/// toujours `min_z <= max_z`.
pub fn z_range(scamin: i32, scamax: i32) -> (i32, i32) {
    let mut min_z = DEFAULT_MIN_ZOOM;
    let mut max_z = ONE_TO_ONE_ZOOM;

    if scamin > 0 {
        min_z = find_zoom(scamin);
    }
    if scamax > 0 {
        max_z = find_zoom(scamax);
    }

    if min_z > max_z {
        std::mem::swap(&mut min_z, &mut max_z);
    }

    (min_z, max_z)
}

/// Parse un entier S-57 en ne gardant que le préfixe numérique:
/// - "12000" → 12000
/// - " 12000.0" → 12000
/// - "+45" → 45
/// - "abc", "", dépassement → 0
pub fn parse_leading_int(raw: &str) -> i32 {
    let s = raw.trim_start();
    let digits_start = usize::from(s.starts_with(['+', '-']));
    let digits_len = s[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return 0;
    }

    s[..digits_start + digits_len].parse().unwrap_or(0)
}
