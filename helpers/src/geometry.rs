use approx::ulps_eq;
use serde::Deserialize;

// 2D ----------------------------------------------------------------------------------------------
// 2D points and vectors live on the ground plane of the world: x maps to the world x axis, y maps
// to the world z axis (the world y axis points upwards).
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct Point2d {
    pub x: f64,
    pub y: f64,
}

impl Point2d {
    pub fn as_vector2d(&self) -> Vector2d {
        Vector2d {
            dx: self.x,
            dy: self.y,
        }
    }
    /// as_point3d lifts the ground plane point to the inserted height.
    pub fn as_point3d(&self, height: f64) -> Point3d {
        Point3d {
            x: self.x,
            y: height,
            z: self.y,
        }
    }
    pub fn shift(&self, other: &Vector2d) -> Point2d {
        self.as_vector2d().add(other).as_point2d()
    }
    /// vector_to returns the vector pointing from this point to the other point.
    pub fn vector_to(&self, other: &Point2d) -> Vector2d {
        other.as_vector2d().sub(&self.as_vector2d())
    }
    pub fn dist_sq(&self, other: &Point2d) -> f64 {
        self.vector_to(other).abs_sq()
    }
}

impl PartialEq for Point2d {
    fn eq(&self, other: &Self) -> bool {
        ulps_eq!(self.x, other.x) && ulps_eq!(self.y, other.y)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Vector2d {
    pub dx: f64,
    pub dy: f64,
}

impl Vector2d {
    /// from_heading returns the unit forward vector for a yaw angle (heading 0 points along +z,
    /// heading pi/2 points along +x).
    pub fn from_heading(heading: f64) -> Vector2d {
        Vector2d {
            dx: heading.sin(),
            dy: heading.cos(),
        }
    }
    pub fn as_point2d(&self) -> Point2d {
        Point2d {
            x: self.dx,
            y: self.dy,
        }
    }
    pub fn as_vector3d(&self) -> Vector3d {
        Vector3d {
            dx: self.dx,
            dy: 0.0,
            dz: self.dy,
        }
    }
    pub fn sub(&self, other: &Self) -> Vector2d {
        Vector2d {
            dx: self.dx - other.dx,
            dy: self.dy - other.dy,
        }
    }
    pub fn add(&self, other: &Self) -> Vector2d {
        Vector2d {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
    pub fn mult(&self, k: f64) -> Vector2d {
        Vector2d {
            dx: self.dx * k,
            dy: self.dy * k,
        }
    }
    pub fn dot(&self, other: &Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy
    }
    /// convenience function (strictly speaking, the cross product is not defined in a 2D space)
    pub fn cross(&self, other: &Self) -> f64 {
        self.dx * other.dy - self.dy * other.dx
    }
    pub fn abs_sq(&self) -> f64 {
        self.dx.powi(2) + self.dy.powi(2)
    }
    pub fn abs(&self) -> f64 {
        self.abs_sq().sqrt()
    }
    /// heading returns the yaw angle of the vector (inverse of from_heading).
    pub fn heading(&self) -> f64 {
        self.dx.atan2(self.dy)
    }
    /// normal_vector returns the vector rotated by 90 degrees, i.e. (-dy, dx).
    pub fn normal_vector(&self) -> Vector2d {
        Vector2d {
            dx: -self.dy,
            dy: self.dx,
        }
    }
    /// normalized returns None for a zero-length vector instead of propagating NaN.
    pub fn normalized(&self) -> Option<Vector2d> {
        let len = self.abs();

        if len > 0.0 {
            Some(self.mult(1.0 / len))
        } else {
            None
        }
    }
}

impl PartialEq for Vector2d {
    fn eq(&self, other: &Self) -> bool {
        ulps_eq!(self.dx, other.dx) && ulps_eq!(self.dy, other.dy)
    }
}

// 3D ----------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    /// ground returns the projection of the point on the ground plane.
    pub fn ground(&self) -> Point2d {
        Point2d {
            x: self.x,
            y: self.z,
        }
    }
    pub fn as_vector3d(&self) -> Vector3d {
        Vector3d {
            dx: self.x,
            dy: self.y,
            dz: self.z,
        }
    }
    pub fn shift(&self, other: &Vector3d) -> Point3d {
        self.as_vector3d().add(other).as_point3d()
    }
    pub fn vector_to(&self, other: &Point3d) -> Vector3d {
        other.as_vector3d().sub(&self.as_vector3d())
    }
    pub fn dist_sq(&self, other: &Point3d) -> f64 {
        self.vector_to(other).abs_sq()
    }
    /// ground_dist_sq returns the squared horizontal distance (height is ignored).
    pub fn ground_dist_sq(&self, other: &Point3d) -> f64 {
        self.ground().dist_sq(&other.ground())
    }
}

impl PartialEq for Point3d {
    fn eq(&self, other: &Self) -> bool {
        ulps_eq!(self.x, other.x) && ulps_eq!(self.y, other.y) && ulps_eq!(self.z, other.z)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Vector3d {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector3d {
    pub fn ground(&self) -> Vector2d {
        Vector2d {
            dx: self.dx,
            dy: self.dz,
        }
    }
    pub fn as_point3d(&self) -> Point3d {
        Point3d {
            x: self.dx,
            y: self.dy,
            z: self.dz,
        }
    }
    pub fn sub(&self, other: &Self) -> Vector3d {
        Vector3d {
            dx: self.dx - other.dx,
            dy: self.dy - other.dy,
            dz: self.dz - other.dz,
        }
    }
    pub fn add(&self, other: &Self) -> Vector3d {
        Vector3d {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
            dz: self.dz + other.dz,
        }
    }
    pub fn mult(&self, k: f64) -> Vector3d {
        Vector3d {
            dx: self.dx * k,
            dy: self.dy * k,
            dz: self.dz * k,
        }
    }
    pub fn dot(&self, other: &Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }
    pub fn cross(&self, other: &Self) -> Vector3d {
        Vector3d {
            dx: self.dy * other.dz - self.dz * other.dy,
            dy: self.dz * other.dx - self.dx * other.dz,
            dz: self.dx * other.dy - self.dy * other.dx,
        }
    }
    pub fn abs_sq(&self) -> f64 {
        self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)
    }
    pub fn abs(&self) -> f64 {
        self.abs_sq().sqrt()
    }
    pub fn normalized(&self) -> Option<Vector3d> {
        let len = self.abs();

        if len > 0.0 {
            Some(self.mult(1.0 / len))
        } else {
            None
        }
    }
}

impl PartialEq for Vector3d {
    fn eq(&self, other: &Self) -> bool {
        ulps_eq!(self.dx, other.dx) && ulps_eq!(self.dy, other.dy) && ulps_eq!(self.dz, other.dz)
    }
}
